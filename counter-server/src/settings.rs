use chrono::NaiveDate;
use config::{Config, File};
use downloads_counter::data_source::HOMEBREW_SPANS;
use serde::{de, Deserialize, Serialize};
use url::Url;

/// Wrapper under [`serde::de::IgnoredAny`] which implements
/// [`PartialEq`] and [`Eq`] for fields to be ignored.
#[derive(Copy, Clone, Debug, Default, Deserialize)]
struct IgnoredAny(de::IgnoredAny);

impl PartialEq for IgnoredAny {
    fn eq(&self, _other: &Self) -> bool {
        // We ignore that values, so they should not impact the equality
        true
    }
}

impl Eq for IgnoredAny {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub db_url: String,
    pub run_migrations: bool,

    /// Reference date mapped to day index 0. Changing it against an already
    /// populated database shifts every persisted key — don't.
    pub epoch: NaiveDate,
    /// Trailing window lengths, in days, tracked by the reconstruction
    /// engine. Must match what the upstream analytics report.
    pub spans: Vec<u32>,

    pub homebrew: HomebrewSettings,
    pub github: GithubSettings,

    // Is required as we deny unknown fields, but allow users provide
    // path to config through PREFIX__CONFIG env variable. If removed,
    // the setup would fail with `unknown field `config`, expected one of...`
    #[serde(skip_serializing, rename = "config")]
    config_path: IgnoredAny,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HomebrewSettings {
    pub enabled: bool,
    pub base_url: Url,
    pub formula: String,
}

impl Default for HomebrewSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: Url::parse("https://formulae.brew.sh/").unwrap(),
            formula: "aztfexport".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSettings {
    pub enabled: bool,
    pub base_url: Url,
    pub owner: String,
    pub repo: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: Url::parse("https://api.github.com/").unwrap(),
            owner: "Azure".to_string(),
            repo: "aztfexport".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_url: Default::default(),
            run_migrations: Default::default(),
            epoch: NaiveDate::from_ymd_opt(2023, 4, 11).unwrap(),
            spans: HOMEBREW_SPANS.to_vec(),
            homebrew: Default::default(),
            github: Default::default(),
            config_path: Default::default(),
        }
    }
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let config_path = std::env::var("COUNTER__CONFIG");

        let mut builder = Config::builder();
        if let Ok(config_path) = config_path {
            builder = builder.add_source(File::with_name(&config_path));
        };
        // Use `__` so that it would be possible to address keys with underscores in names
        builder = builder.add_source(config::Environment::with_prefix("COUNTER").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;

        Ok(settings)
    }
}
