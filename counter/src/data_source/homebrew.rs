use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{DataSource, FetchError};
use crate::types::{OsType, Span};

/// The analytics windows served by the formula API.
pub const HOMEBREW_SPANS: [u32; 3] = [30, 90, 365];

/// Rolling install totals for one OS, as reported by the formula API on a
/// given day. Homebrew never exposes daily numbers; these windows are what
/// the reconstruction engine works back from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanSnapshot {
    pub os_type: OsType,
    pub totals: BTreeMap<Span, i64>,
}

/// Client for `formulae.brew.sh` formula analytics.
///
/// The base URL is injected so tests can point it at a local mock server.
#[derive(Debug, Clone)]
pub struct HomebrewSource {
    client: reqwest::Client,
    base_url: Url,
    formula: String,
}

impl HomebrewSource {
    pub fn new(base_url: Url, formula: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            formula: formula.into(),
        }
    }
}

#[async_trait]
impl DataSource for HomebrewSource {
    type Output = Vec<SpanSnapshot>;

    async fn fetch(&self) -> Result<Self::Output, FetchError> {
        let url = self
            .base_url
            .join(&format!("api/formula/{}.json", self.formula))
            .map_err(|e| FetchError::Payload(e.to_string()))?;
        let response: FormulaResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(vec![
            snapshot(OsType::Darwin, &self.formula, &response.analytics),
            snapshot(OsType::Linux, &self.formula, &response.analytics_linux),
        ])
    }
}

fn snapshot(os_type: OsType, formula: &str, analytics: &Analytics) -> SpanSnapshot {
    let install = &analytics.install;
    let totals = [
        (Span::new(30), &install.last_30d),
        (Span::new(90), &install.last_90d),
        (Span::new(365), &install.last_365d),
    ]
    .into_iter()
    .map(|(span, counts)| (span, counts.get(formula).copied().unwrap_or(0)))
    .collect();
    SpanSnapshot { os_type, totals }
}

#[derive(Debug, Deserialize)]
struct FormulaResponse {
    #[serde(default)]
    analytics: Analytics,
    #[serde(rename = "analytics-linux", default)]
    analytics_linux: Analytics,
}

#[derive(Debug, Default, Deserialize)]
struct Analytics {
    #[serde(default)]
    install: InstallCounts,
}

#[derive(Debug, Default, Deserialize)]
struct InstallCounts {
    #[serde(rename = "30d", default)]
    last_30d: HashMap<String, i64>,
    #[serde(rename = "90d", default)]
    last_90d: HashMap<String, i64>,
    #[serde(rename = "365d", default)]
    last_365d: HashMap<String, i64>,
}
