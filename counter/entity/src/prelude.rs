pub use super::{
    day_counts::Entity as DayCounts, release_downloads::Entity as ReleaseDownloads,
    span_counts::Entity as SpanCounts,
};
