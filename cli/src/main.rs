//! Geofence CLI
//!
//! Command-line interface for inspecting and editing a CDN distribution's
//! geo restrictions.
//!
//! # Usage
//!
//! ```bash
//! geofence check E1234567890ABCD
//! geofence edit E1234567890ABCD
//! geofence channel ch-news-hd --distribution E1234567890ABCD
//! geofence distributions list
//! geofence config set api_token <TOKEN>
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod config;
mod output;
mod refdata;

#[derive(Parser)]
#[command(name = "geofence")]
#[command(version = "0.1.0")]
#[command(about = "CDN geo-restriction manager", long_about = None)]
struct Cli {
    /// CDN API endpoint URL
    #[arg(long, env = "GEOFENCE_API_URL")]
    api_url: Option<String>,

    /// CDN API token
    #[arg(long, env = "GEOFENCE_API_TOKEN")]
    api_token: Option<String>,

    /// Delivery API endpoint URL (channel lookups)
    #[arg(long, env = "GEOFENCE_DELIVERY_API_URL")]
    delivery_api_url: Option<String>,

    /// Delivery API token
    #[arg(long, env = "GEOFENCE_DELIVERY_API_TOKEN")]
    delivery_api_token: Option<String>,

    /// Path to the country code table
    #[arg(long, env = "GEOFENCE_COUNTRY_CODES")]
    country_codes: Option<PathBuf>,

    /// Path to the cluster regions table
    #[arg(long, env = "GEOFENCE_CLUSTER_REGIONS")]
    cluster_regions: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a distribution's geo restrictions
    Check { distribution_id: String },
    /// Interactively edit a distribution's geo restrictions
    Edit { distribution_id: String },
    /// Check whether a channel's deployment countries can reach a distribution
    Channel {
        channel_id: String,
        /// Distribution to check against
        #[arg(long)]
        distribution: String,
    },
    /// Manage configured distributions
    Distributions {
        #[command(subcommand)]
        action: DistributionCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum DistributionCommands {
    /// List distribution ids from the profile config
    List,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // A missing profile file falls back to defaults; a malformed one is fatal
    let config = config::Config::load(cli.profile.as_deref())?;
    let settings = config::Settings::merge(cli_overrides(&cli), config);

    match cli.command {
        Commands::Check { distribution_id } => {
            commands::check::handle(&distribution_id, &settings, cli.format).await
        }
        Commands::Edit { distribution_id } => {
            commands::edit::handle(&distribution_id, &settings).await
        }
        Commands::Channel {
            channel_id,
            distribution,
        } => commands::channel::handle(&channel_id, &distribution, &settings, cli.format).await,
        Commands::Distributions { action } => {
            commands::distributions::handle(action, &settings, cli.format)
        }
        Commands::Config { action } => commands::config::handle(action),
    }
}

fn cli_overrides(cli: &Cli) -> config::Config {
    config::Config {
        api_url: cli.api_url.clone(),
        api_token: cli.api_token.clone(),
        delivery_api_url: cli.delivery_api_url.clone(),
        delivery_api_token: cli.delivery_api_token.clone(),
        country_codes: cli.country_codes.clone(),
        cluster_regions: cli.cluster_regions.clone(),
        distributions: Vec::new(),
    }
}
