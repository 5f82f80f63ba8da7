//! Country and cluster lookup tables
//!
//! Both tables are loaded once per run from external JSON and are immutable
//! for the session. They are passed by reference into the resolver and
//! comparator; there are no ambient globals.

use crate::{CountryCode, GeofenceError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Cloud provider hosting a cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    Aws,
    Gcp,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Gcp => "GCP",
        }
    }
}

// =============================================================================
// Country Table
// =============================================================================

/// Country code <-> human-readable name mapping
#[derive(Debug, Default)]
pub struct CountryTable {
    names: BTreeMap<CountryCode, String>,
    by_name: HashMap<String, CountryCode>,
}

impl CountryTable {
    /// Build from a code -> name map
    pub fn from_map(map: BTreeMap<String, String>) -> Result<Self> {
        let mut table = Self::default();
        for (code, name) in map {
            let code = CountryCode::parse(&code).map_err(|_| {
                GeofenceError::Config(format!("country table has invalid code: {:?}", code))
            })?;
            table.by_name.insert(name.to_lowercase(), code.clone());
            table.names.insert(code, name);
        }
        Ok(table)
    }

    /// Parse the `{"country_codes": {"US": "United States", ...}}` document
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        #[derive(Deserialize)]
        struct CountryFile {
            #[serde(default)]
            country_codes: BTreeMap<String, String>,
        }

        let file: CountryFile = serde_json::from_value(value.clone())
            .map_err(|e| GeofenceError::Config(format!("malformed country table: {}", e)))?;
        Self::from_map(file.country_codes)
    }

    /// Human-readable name, falling back to the bare code on a miss
    pub fn name_of<'a>(&'a self, code: &'a CountryCode) -> &'a str {
        self.names.get(code).map(String::as_str).unwrap_or_else(|| {
            tracing::warn!(code = %code, "country code has no name mapping");
            code.as_str()
        })
    }

    /// Resolve user input that may be a code or a full country name
    pub fn resolve(&self, input: &str) -> Option<CountryCode> {
        if let Ok(code) = CountryCode::parse(input) {
            if self.names.contains_key(&code) {
                return Some(code);
            }
        }
        self.by_name.get(&input.trim().to_lowercase()).cloned()
    }

    pub fn contains(&self, code: &CountryCode) -> bool {
        self.names.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CountryCode, &str)> {
        self.names.iter().map(|(c, n)| (c, n.as_str()))
    }
}

// =============================================================================
// Cluster Table
// =============================================================================

/// Static record binding a cluster to its region, location, and country
///
/// `country` is optional on the wire; entries missing it are reported by the
/// resolver, never silently defaulted.
#[derive(Clone, Debug)]
pub struct ClusterEntry {
    pub provider: CloudProvider,
    pub region: String,
    pub location: Option<String>,
    pub country: Option<CountryCode>,
}

/// Cluster identifier -> entry table
///
/// Identifiers are matched case-insensitively; keys are normalized to
/// lowercase at load time.
#[derive(Debug, Default)]
pub struct ClusterTable {
    entries: HashMap<String, ClusterEntry>,
}

#[derive(Deserialize)]
struct RawClusterEntry {
    region: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Deserialize)]
struct ClusterFile {
    #[serde(default)]
    aws_eks_clusters: BTreeMap<String, RawClusterEntry>,
    #[serde(default)]
    gcp_gke_clusters: BTreeMap<String, RawClusterEntry>,
}

impl ClusterTable {
    /// Parse the cluster regions document
    ///
    /// A duplicate identifier across providers that resolves to two different
    /// countries is a configuration error, not resolved by precedence.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let file: ClusterFile = serde_json::from_value(value.clone())
            .map_err(|e| GeofenceError::Config(format!("malformed cluster table: {}", e)))?;

        let mut table = Self::default();
        for (provider, group) in [
            (CloudProvider::Aws, file.aws_eks_clusters),
            (CloudProvider::Gcp, file.gcp_gke_clusters),
        ] {
            for (id, raw) in group {
                let key = id.to_lowercase();
                let country = match raw.country {
                    Some(c) => Some(CountryCode::parse(&c).map_err(|_| {
                        GeofenceError::Config(format!(
                            "cluster {} has invalid country code: {:?}",
                            id, c
                        ))
                    })?),
                    None => None,
                };
                let entry = ClusterEntry {
                    provider,
                    region: raw.region,
                    location: raw.location,
                    country,
                };

                if let Some(existing) = table.entries.get(&key) {
                    if existing.country != entry.country {
                        return Err(GeofenceError::Config(format!(
                            "cluster {} is defined by both {} and {} with different countries",
                            id,
                            existing.provider.as_str(),
                            entry.provider.as_str()
                        )));
                    }
                    tracing::warn!(cluster = %id, "duplicate cluster entry with matching country");
                    continue;
                }
                table.entries.insert(key, entry);
            }
        }
        Ok(table)
    }

    /// Case-insensitive lookup, returning the canonical id alongside the entry
    pub fn get(&self, id: &str) -> Option<(&str, &ClusterEntry)> {
        let key = id.to_lowercase();
        self.entries.get_key_value(&key).map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
