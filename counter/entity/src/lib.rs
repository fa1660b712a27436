pub mod prelude;

pub mod day_counts;
pub mod release_downloads;
pub mod span_counts;
