//! CLI commands

pub mod channel;
pub mod check;
pub mod config;
pub mod distributions;
pub mod edit;

use colored::Colorize;
use geofence_core::tables::CountryTable;
use geofence_core::{client::DistributionSummary, RestrictionConfig, RestrictionMode};

/// One-line distribution header shared by check/edit/channel
pub fn print_summary(summary: &DistributionSummary) {
    println!(
        "Distribution {} ({}) - {}",
        summary.id.bold(),
        summary.domain_name,
        summary.status
    );
}

/// Human-readable restriction line, e.g. `ALLOW LIST: United States (US)`
pub fn describe_restriction(config: &RestrictionConfig, countries: &CountryTable) -> String {
    let listed = config
        .countries
        .iter()
        .map(|c| format!("{} ({})", countries.name_of(c), c))
        .collect::<Vec<_>>()
        .join(", ");

    match config.mode {
        RestrictionMode::None => "no geo restrictions".to_string(),
        RestrictionMode::Allowlist => format!("{}: {}", "ALLOWED countries".green(), listed),
        RestrictionMode::Denylist => format!("{}: {}", "BLOCKED countries".red(), listed),
    }
}
