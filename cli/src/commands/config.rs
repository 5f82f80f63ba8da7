//! Config commands

use crate::config::Config;
use crate::ConfigCommands;
use anyhow::bail;
use std::path::PathBuf;

fn masked(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}****", prefix)
}

pub fn handle(action: ConfigCommands) -> anyhow::Result<()> {
    match action {
        ConfigCommands::Init => {
            let config = Config::default();
            config.save()?;
            println!("configuration initialized at ~/.geofence/config.toml");
        }
        ConfigCommands::Set { key, value } => {
            // A malformed file must abort here: saving over it would drop
            // every key it held
            let mut config = Config::load(None)?;
            match key.as_str() {
                "api_url" => config.api_url = Some(value),
                "api_token" => config.api_token = Some(value),
                "delivery_api_url" => config.delivery_api_url = Some(value),
                "delivery_api_token" => config.delivery_api_token = Some(value),
                "country_codes" => config.country_codes = Some(PathBuf::from(value)),
                "cluster_regions" => config.cluster_regions = Some(PathBuf::from(value)),
                _ => bail!("unknown config key: {}", key),
            }
            config.save()?;
            println!("set {} successfully", key);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load(None)?;
            let value = match key.as_str() {
                "api_url" => config.api_url,
                "api_token" => config.api_token.map(|t| masked(&t)),
                "delivery_api_url" => config.delivery_api_url,
                "delivery_api_token" => config.delivery_api_token.map(|t| masked(&t)),
                "country_codes" => config.country_codes.map(|p| p.display().to_string()),
                "cluster_regions" => config.cluster_regions.map(|p| p.display().to_string()),
                _ => bail!("unknown config key: {}", key),
            };
            println!("{}: {}", key, value.unwrap_or_else(|| "(not set)".into()));
        }
        ConfigCommands::List => {
            let config = Config::load(None)?;
            let not_set = || "(not set)".to_string();
            println!("api_url: {}", config.api_url.unwrap_or_else(not_set));
            println!(
                "api_token: {}",
                config.api_token.map(|t| masked(&t)).unwrap_or_else(not_set)
            );
            println!(
                "delivery_api_url: {}",
                config.delivery_api_url.unwrap_or_else(not_set)
            );
            println!(
                "delivery_api_token: {}",
                config
                    .delivery_api_token
                    .map(|t| masked(&t))
                    .unwrap_or_else(not_set)
            );
            println!(
                "country_codes: {}",
                config
                    .country_codes
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(not_set)
            );
            println!(
                "cluster_regions: {}",
                config
                    .cluster_regions
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(not_set)
            );
            if !config.distributions.is_empty() {
                println!("distributions: {}", config.distributions.join(", "));
            }
        }
    }
    Ok(())
}
