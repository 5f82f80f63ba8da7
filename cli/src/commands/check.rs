//! Check command

use crate::config::Settings;
use crate::output::OutputFormat;
use geofence_core::client::DistributionApi;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct CountryRow {
    code: String,
    name: String,
}

pub async fn handle(
    distribution_id: &str,
    settings: &Settings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let countries = crate::refdata::load_country_table(&settings.country_codes)?;
    let client = settings.cdn_client()?;

    let state = client.fetch(distribution_id).await?;

    super::print_summary(&state.summary);
    println!(
        "{}",
        super::describe_restriction(&state.restriction, &countries)
    );

    if !state.restriction.countries.is_empty() {
        let rows: Vec<CountryRow> = state
            .restriction
            .countries
            .iter()
            .map(|c| CountryRow {
                code: c.to_string(),
                name: countries.name_of(c).to_string(),
            })
            .collect();
        format.print_rows(&rows);
    }

    Ok(())
}
