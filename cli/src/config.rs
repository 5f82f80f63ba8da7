//! CLI configuration
//!
//! Profile config lives at `~/.geofence/config.toml` (or
//! `config.<profile>.toml`). Command-line flags and environment variables
//! override the file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub delivery_api_url: Option<String>,
    pub delivery_api_token: Option<String>,
    pub country_codes: Option<PathBuf>,
    pub cluster_regions: Option<PathBuf>,
    #[serde(default)]
    pub distributions: Vec<String>,
}

impl Config {
    /// Load the profile config
    ///
    /// A missing file yields defaults; an unreadable or malformed file is an
    /// error and must never silently degrade to defaults (a later save would
    /// replace the broken file and lose its keys).
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("invalid TOML in {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path(None)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content).with_context(|| format!("cannot write {}", path.display()))
    }

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".geofence").join(filename))
    }
}

/// Effective settings after merging flags/env over the profile config
#[derive(Debug)]
pub struct Settings {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub delivery_api_url: Option<String>,
    pub delivery_api_token: Option<String>,
    pub country_codes: PathBuf,
    pub cluster_regions: PathBuf,
    pub distributions: Vec<String>,
}

impl Settings {
    pub fn merge(overrides: Config, file: Config) -> Self {
        Self {
            api_url: overrides.api_url.or(file.api_url),
            api_token: overrides.api_token.or(file.api_token),
            delivery_api_url: overrides.delivery_api_url.or(file.delivery_api_url),
            delivery_api_token: overrides.delivery_api_token.or(file.delivery_api_token),
            country_codes: overrides
                .country_codes
                .or(file.country_codes)
                .unwrap_or_else(|| PathBuf::from("country_codes.json")),
            cluster_regions: overrides
                .cluster_regions
                .or(file.cluster_regions)
                .unwrap_or_else(|| PathBuf::from("cluster_regions.json")),
            distributions: file.distributions,
        }
    }

    pub fn cdn_client(&self) -> anyhow::Result<geofence_core::client::CdnClient> {
        let url = self
            .api_url
            .as_deref()
            .context("no API URL configured; pass --api-url or run `geofence config set api_url <URL>`")?;
        let token = self
            .api_token
            .as_deref()
            .context("no API token configured; pass --api-token or run `geofence config set api_token <TOKEN>`")?;
        Ok(geofence_core::client::CdnClient::new(url, token)?)
    }

    pub fn channel_client(&self) -> anyhow::Result<geofence_core::channel::ChannelClient> {
        let url = self
            .delivery_api_url
            .as_deref()
            .context("no delivery API URL configured; run `geofence config set delivery_api_url <URL>`")?;
        let token = self
            .delivery_api_token
            .as_deref()
            .context("no delivery API token configured; run `geofence config set delivery_api_token <TOKEN>`")?;
        Ok(geofence_core::channel::ChannelClient::new(url, token)?)
    }
}
