use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{DataSource, FetchError};
use crate::types::OsType;

const PER_PAGE: usize = 20;

/// Cumulative download counter of one release asset, attributed to a
/// `(version, os, arch)` triple parsed out of the asset file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDownloads {
    pub version: String,
    pub os_type: OsType,
    pub arch: String,
    pub total: i64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub content_type: String,
    pub download_count: i64,
}

/// Client for the GitHub releases API of one repository.
#[derive(Debug, Clone)]
pub struct GithubSource {
    client: reqwest::Client,
    base_url: Url,
    owner: String,
    repo: String,
}

impl GithubSource {
    pub fn new(base_url: Url, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    async fn releases_page(&self, page: usize) -> Result<Vec<Release>, FetchError> {
        let url = self
            .base_url
            .join(&format!("repos/{}/{}/releases", self.owner, self.repo))
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        let releases = self
            .client
            .get(url)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            // the API rejects requests without a user agent
            .header(reqwest::header::USER_AGENT, "downloads-counter")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(releases)
    }
}

#[async_trait]
impl DataSource for GithubSource {
    type Output = Vec<AssetDownloads>;

    async fn fetch(&self) -> Result<Self::Output, FetchError> {
        let mut output = Vec::new();
        for page in 1.. {
            let releases = self.releases_page(page).await?;
            let is_last_page = releases.len() < PER_PAGE;
            for release in releases {
                for asset in &release.assets {
                    // checksum files and other auxiliary assets don't parse;
                    // they carry no download statistics we care about
                    let Some((version, os_type, arch)) =
                        parse_asset_name(&asset.name, &asset.content_type)
                    else {
                        continue;
                    };
                    output.push(AssetDownloads {
                        version,
                        os_type,
                        arch,
                        total: asset.download_count,
                        published_at: release.published_at,
                    });
                }
            }
            if is_last_page {
                break;
            }
        }
        Ok(output)
    }
}

static ZIP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*_(v\d+\.\d+\.\d+)_([a-z]+)_(.+)\.zip$").unwrap());
static MSI_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*_(v\d+\.\d+\.\d+)_(.+)\.msi$").unwrap());
static TAR_GZ_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".*?_(v?\d+\.\d+\.\d+)_([a-z]+)_(.+?)\.tar\.gz$").unwrap());

/// Extract `(version, os, arch)` from a release asset file name, e.g.
/// `aztfexport_v0.12.0_linux_arm64.tar.gz`. MSI installers only exist for
/// Windows, so their name omits the OS part.
pub fn parse_asset_name(name: &str, content_type: &str) -> Option<(String, OsType, String)> {
    match content_type {
        "application/zip" => {
            let captures = ZIP_NAME.captures(name)?;
            let os_type = captures[2].parse().ok()?;
            Some((captures[1].to_string(), os_type, captures[3].to_string()))
        }
        "application/x-msdownload" => {
            let captures = MSI_NAME.captures(name)?;
            Some((captures[1].to_string(), OsType::Windows, captures[2].to_string()))
        }
        "application/gzip" => {
            let captures = TAR_GZ_NAME.captures(name)?;
            let os_type = captures[2].parse().ok()?;
            Some((captures[1].to_string(), os_type, captures[3].to_string()))
        }
        _ => None,
    }
}
