//! Static reference data
//!
//! Loads the two read-only JSON tables: country code <-> name and cluster
//! identifier -> {region, location, country}. A missing or malformed file is
//! fatal; key misses inside a loaded table degrade to warnings downstream.

use anyhow::Context;
use geofence_core::tables::{ClusterTable, CountryTable};
use std::path::Path;

pub fn load_country_table(path: &Path) -> anyhow::Result<CountryTable> {
    let value = read_json(path)?;
    let table = CountryTable::from_json(&value)
        .with_context(|| format!("invalid country table {}", path.display()))?;
    tracing::debug!(path = %path.display(), countries = table.len(), "loaded country table");
    Ok(table)
}

pub fn load_cluster_table(path: &Path) -> anyhow::Result<ClusterTable> {
    let value = read_json(path)?;
    let table = ClusterTable::from_json(&value)
        .with_context(|| format!("invalid cluster table {}", path.display()))?;
    tracing::debug!(path = %path.display(), clusters = table.len(), "loaded cluster table");
    Ok(table)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read reference data {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
