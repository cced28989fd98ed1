//! Application configuration.
//!
//! Settings live in `~/.config/staygrid/config.toml`; every key is optional.
//! Feed addresses can also come from the environment as
//! `<PLATFORM>_<PROPERTY>_<INDEX>`, e.g. `AIRBNB_LOGEMENT_3=https://...`
//! registers the Airbnb feed of property `logement-3`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StayGridError, StayGridResult};
use crate::feed::FeedSource;
use crate::grid::OccupancyPolicy;
use crate::platform::Platform;

static DEFAULT_DATA_DIR: &str = "~/.local/share/staygrid";
static DEFAULT_REFRESH_INTERVAL: &str = "1h";
static DEFAULT_REQUEST_TIMEOUT: &str = "30s";
const DEFAULT_PORT: u16 = 3001;

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_refresh_interval() -> String {
    DEFAULT_REFRESH_INTERVAL.to_string()
}

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the name and vendor mapping files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub occupancy_policy: OccupancyPolicy,

    #[serde(default)]
    pub feeds: Vec<FeedSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_data_dir(),
            refresh_interval: default_refresh_interval(),
            request_timeout: default_request_timeout(),
            port: default_port(),
            occupancy_policy: OccupancyPolicy::default(),
            feeds: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> StayGridResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StayGridError::Config("Could not determine config directory".into()))?
            .join("staygrid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> StayGridResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> StayGridResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> StayGridResult<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| StayGridError::Config(e.to_string()))?;
        // Surface bad durations at load time rather than at first use
        config.refresh_interval()?;
        config.request_timeout()?;
        Ok(config)
    }

    /// Write the config to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> StayGridResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| StayGridError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StayGridError::ConfigWrite(format!("Could not create config directory: {e}"))
            })?;
        }
        std::fs::write(path, content)
            .map_err(|e| StayGridError::ConfigWrite(format!("Could not write config file: {e}")))
    }

    /// Add a feed, replacing any configured feed for the same (property, platform).
    pub fn upsert_feed(&mut self, feed: FeedSource) {
        self.feeds.retain(|f| f.key() != feed.key());
        self.feeds.push(feed);
    }

    /// Data directory with `~` and environment variables expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::full(&self.data_dir).map_or_else(
            |_| self.data_dir.clone(),
            |expanded| expanded.into_owned(),
        ))
    }

    pub fn refresh_interval(&self) -> StayGridResult<Duration> {
        parse_setting("refresh_interval", &self.refresh_interval)
    }

    pub fn request_timeout(&self) -> StayGridResult<Duration> {
        parse_setting("request_timeout", &self.request_timeout)
    }

    /// Feeds from the config file plus the process environment.
    ///
    /// When both name the same (property, platform), the config file wins.
    pub fn all_feeds(&self) -> Vec<FeedSource> {
        merge_feeds(self.feeds.clone(), feeds_from_env(std::env::vars()))
    }
}

fn parse_setting(name: &str, value: &str) -> StayGridResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| StayGridError::Config(format!("{name} = '{value}': {e}")))
}

/// Append `extra` feeds whose (property, platform) is not already taken.
pub fn merge_feeds(mut feeds: Vec<FeedSource>, extra: Vec<FeedSource>) -> Vec<FeedSource> {
    for feed in extra {
        if !feeds.iter().any(|f| f.key() == feed.key()) {
            feeds.push(feed);
        }
    }
    feeds
}

/// Read feed addresses from environment-style pairs.
///
/// Invalid addresses are skipped with a warning. Output is ordered by
/// property index, then platform.
pub fn feeds_from_env(vars: impl IntoIterator<Item = (String, String)>) -> Vec<FeedSource> {
    let mut found: Vec<(u64, FeedSource)> = vars
        .into_iter()
        .filter_map(|(name, value)| {
            let (platform, property_key, index) = parse_env_feed_name(&name)?;
            if value.trim().is_empty() {
                return None;
            }
            match FeedSource::new(&property_key, platform, &value) {
                Ok(source) => Some((index, source)),
                Err(e) => {
                    tracing::warn!(variable = %name, error = %e, "ignoring feed variable");
                    None
                }
            }
        })
        .collect();

    found.sort_by(|(ia, a), (ib, b)| {
        ia.cmp(ib)
            .then(a.property_key.cmp(&b.property_key))
            .then(a.platform.cmp(&b.platform))
    });
    found.into_iter().map(|(_, source)| source).collect()
}

/// `AIRBNB_LOGEMENT_3` -> (Airbnb, "logement-3", 3)
fn parse_env_feed_name(name: &str) -> Option<(Platform, String, u64)> {
    let (prefix, rest) = name.split_once('_')?;
    let platform = Platform::ALL
        .into_iter()
        .find(|p| p.env_prefix() == prefix)?;
    let (stem, index) = rest.rsplit_once('_')?;
    if stem.is_empty() {
        return None;
    }
    let index: u64 = index.parse().ok()?;
    let property_key = format!("{}-{}", stem.to_lowercase().replace('_', "-"), index);
    Some((platform, property_key, index))
}
