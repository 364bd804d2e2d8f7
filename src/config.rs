use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::target::{COUNTRIES, DEFAULT_LIMIT, TOPLISTS};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
pub const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";
pub const DEFAULT_ROOT_DIR: &str = "/import/appstore/toplist";

/// Knobs of the HTTP client used for every fetch.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    #[serde(rename = "connection_timeout_ms", deserialize_with = "millis")]
    pub connection_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Everything a run needs, fixed before the first fetch.
///
/// Built from [`Default`], optionally a TOML file, then the builder methods.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub base_url: String,
    pub root_dir: PathBuf,
    pub countries: Vec<String>,
    pub lists: Vec<String>,
    pub limit: u32,
    pub jobs: usize,
    pub fetch: FetcherConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            countries: COUNTRIES.iter().map(|c| (*c).to_owned()).collect(),
            lists: TOPLISTS.iter().map(|l| (*l).to_owned()).collect(),
            limit: DEFAULT_LIMIT,
            jobs: 1,
            fetch: FetcherConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn base_url(self, base_url: String) -> Self {
        Self { base_url, ..self }
    }

    pub fn root_dir(self, root_dir: PathBuf) -> Self {
        Self { root_dir, ..self }
    }

    pub fn countries(self, countries: Vec<String>) -> Self {
        Self { countries, ..self }
    }

    pub fn lists(self, lists: Vec<String>) -> Self {
        Self { lists, ..self }
    }

    pub fn limit(self, limit: u32) -> Self {
        Self { limit, ..self }
    }

    /// At least one pair is always in flight.
    pub fn jobs(self, jobs: usize) -> Self {
        Self {
            jobs: jobs.max(1),
            ..self
        }
    }

    pub fn connection_timeout(self, connection_timeout: Duration) -> Self {
        Self {
            fetch: FetcherConfig {
                connection_timeout,
                ..self.fetch
            },
            ..self
        }
    }

    pub fn max_redirects(self, max_redirects: usize) -> Self {
        Self {
            fetch: FetcherConfig {
                max_redirects,
                ..self.fetch
            },
            ..self
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
