//! Distributions commands

use crate::config::Settings;
use crate::output::OutputFormat;
use crate::DistributionCommands;
use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled)]
struct DistributionRow {
    id: String,
}

pub fn handle(
    action: DistributionCommands,
    settings: &Settings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match action {
        DistributionCommands::List => {
            if settings.distributions.is_empty() {
                println!("no distribution ids configured");
                return Ok(());
            }
            let rows: Vec<DistributionRow> = settings
                .distributions
                .iter()
                .map(|id| DistributionRow { id: id.clone() })
                .collect();
            format.print_rows(&rows);
        }
    }
    Ok(())
}
