//! Channel command
//!
//! Resolves a channel's deployment setups to countries and reports which of
//! them the distribution's geo restriction lets through. Lookup misses are
//! collected and printed as warnings at the end; they never abort the run.

use crate::config::Settings;
use crate::output::OutputFormat;
use colored::Colorize;
use geofence_core::client::DistributionApi;
use geofence_core::comparator;
use geofence_core::resolver::SetupResolver;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct VerdictRow {
    country: String,
    name: String,
    via_clusters: String,
    access: String,
}

pub async fn handle(
    channel_id: &str,
    distribution_id: &str,
    settings: &Settings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let countries = crate::refdata::load_country_table(&settings.country_codes)?;
    let clusters = crate::refdata::load_cluster_table(&settings.cluster_regions)?;

    let setups = settings.channel_client()?.delivery_setups(channel_id).await?;
    if setups.is_empty() {
        println!("no deployment setups found for channel {}", channel_id);
        return Ok(());
    }
    println!("setups for channel {}: {}", channel_id, setups.join(", "));

    let resolver = SetupResolver::new(&clusters);
    let resolution = resolver.resolve_all(&setups);

    let client = settings.cdn_client()?;
    let state = client.fetch(distribution_id).await?;

    super::print_summary(&state.summary);
    println!(
        "{}",
        super::describe_restriction(&state.restriction, &countries)
    );
    println!();

    let report = comparator::evaluate(&state.restriction, &resolution.resolved);

    if report.nothing_to_check() {
        println!("nothing to check: no setup resolved to a country");
    } else {
        let rows: Vec<VerdictRow> = report
            .verdicts
            .iter()
            .map(|v| VerdictRow {
                country: v.country.to_string(),
                name: countries.name_of(&v.country).to_string(),
                via_clusters: v.via_clusters.join(", "),
                access: if v.reachable {
                    "reachable".green().to_string()
                } else {
                    "blocked".red().to_string()
                },
            })
            .collect();
        format.print_rows(&rows);

        let blocked: Vec<String> = report.blocked().map(|v| v.country.to_string()).collect();
        if blocked.is_empty() {
            println!("{}", "all required countries are reachable".green());
        } else {
            println!(
                "{} {}",
                "blocked countries:".red(),
                blocked.join(", ")
            );
        }
    }

    // Aggregated warnings last, as one batch
    if !resolution.unresolved.is_empty() {
        println!(
            "{} setups not found in cluster table: {}",
            "warning:".yellow(),
            resolution.unresolved.join(", ")
        );
    }
    if !resolution.missing_country.is_empty() {
        println!(
            "{} clusters missing a country code: {}",
            "warning:".yellow(),
            resolution.missing_country.join(", ")
        );
    }

    Ok(())
}
