//! Upstream collaborators the raw counts are pulled from.
//!
//! Each source is a thin HTTP client producing typed observations; all
//! interpretation (seeding the store, running the reconstruction engine)
//! happens in the jobs that drive them.

mod github;
mod homebrew;

pub use github::{AssetDownloads, GithubSource, Release, ReleaseAsset};
pub use homebrew::{HomebrewSource, SpanSnapshot, HOMEBREW_SPANS};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// Thing that can pull one round of raw download counts.
#[async_trait]
pub trait DataSource {
    type Output: Send;

    async fn fetch(&self) -> Result<Self::Output, FetchError>;
}
