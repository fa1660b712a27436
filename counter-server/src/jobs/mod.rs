//! One-shot ingestion jobs, one per upstream source. Each job pulls a
//! round of raw counts, persists them, and (where the upstream only serves
//! rolling windows) hands the partition over to the reconstruction engine.

mod github;
mod homebrew;

pub use github::GithubJob;
pub use homebrew::HomebrewJob;
