//! Setup identifier resolution
//!
//! Maps free-form "setup" strings (e.g. `ts-us-e1-n2`) to cluster entries and
//! thus countries. GCP clusters are commonly registered with a `-gke` suffix
//! that the delivery documents omit, so a miss retries with the suffix
//! appended. Misses degrade to warnings aggregated per batch; one bad setup
//! never blocks the rest.

use crate::tables::{CloudProvider, ClusterTable};
use crate::CountryCode;

/// Alternate-provider naming suffix tried on an exact-match miss
pub const ALT_PROVIDER_SUFFIX: &str = "-gke";

/// A setup successfully resolved to a country
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSetup {
    /// The setup string as given
    pub setup: String,
    /// Canonical cluster identifier that matched
    pub cluster_id: String,
    pub provider: CloudProvider,
    pub region: String,
    pub location: Option<String>,
    pub country: CountryCode,
}

/// Outcome of resolving a single setup
#[derive(Clone, Debug)]
pub enum SetupMatch {
    Resolved(ResolvedSetup),
    /// Cluster exists but its entry has no country code
    MissingCountry {
        cluster_id: String,
        location: Option<String>,
    },
    NotFound,
}

/// Aggregated outcome of a batch resolution
#[derive(Clone, Debug, Default)]
pub struct ResolutionReport {
    pub resolved: Vec<ResolvedSetup>,
    /// Setup strings that matched no cluster, suffix fallback included
    pub unresolved: Vec<String>,
    /// Clusters that matched but carry no country code, as display strings
    pub missing_country: Vec<String>,
}

impl ResolutionReport {
    pub fn has_warnings(&self) -> bool {
        !self.unresolved.is_empty() || !self.missing_country.is_empty()
    }
}

/// Resolves setup identifiers against an immutable cluster table
pub struct SetupResolver<'a> {
    clusters: &'a ClusterTable,
}

impl<'a> SetupResolver<'a> {
    pub fn new(clusters: &'a ClusterTable) -> Self {
        Self { clusters }
    }

    /// Resolve one setup: exact match first, then the `-gke` variant
    pub fn resolve(&self, setup: &str) -> SetupMatch {
        let trimmed = setup.trim();
        let with_suffix = format!("{}{}", trimmed, ALT_PROVIDER_SUFFIX);

        let hit = self
            .clusters
            .get(trimmed)
            .or_else(|| self.clusters.get(&with_suffix));

        match hit {
            Some((cluster_id, entry)) => match &entry.country {
                Some(country) => SetupMatch::Resolved(ResolvedSetup {
                    setup: trimmed.to_string(),
                    cluster_id: cluster_id.to_string(),
                    provider: entry.provider,
                    region: entry.region.clone(),
                    location: entry.location.clone(),
                    country: country.clone(),
                }),
                None => SetupMatch::MissingCountry {
                    cluster_id: cluster_id.to_string(),
                    location: entry.location.clone(),
                },
            },
            None => SetupMatch::NotFound,
        }
    }

    /// Resolve a batch, aggregating warnings instead of failing
    pub fn resolve_all<S: AsRef<str>>(&self, setups: &[S]) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        for setup in setups {
            let setup = setup.as_ref();
            match self.resolve(setup) {
                SetupMatch::Resolved(resolved) => {
                    if resolved.cluster_id != resolved.setup {
                        tracing::info!(
                            setup = %resolved.setup,
                            cluster = %resolved.cluster_id,
                            "setup matched via suffix fallback"
                        );
                    }
                    report.resolved.push(resolved);
                }
                SetupMatch::MissingCountry {
                    cluster_id,
                    location,
                } => {
                    let label = match location {
                        Some(loc) => format!("{} ({})", cluster_id, loc),
                        None => format!("{} (no location)", cluster_id),
                    };
                    tracing::warn!(cluster = %cluster_id, "cluster entry is missing a country code");
                    report.missing_country.push(label);
                }
                SetupMatch::NotFound => {
                    tracing::warn!(setup = %setup, "setup not found in cluster table");
                    report.unresolved.push(setup.trim().to_string());
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cluster_table() -> ClusterTable {
        ClusterTable::from_json(&json!({
            "aws_eks_clusters": {
                "ts-us-e1-n1": {
                    "region": "us-east-1",
                    "location": "N. Virginia",
                    "country": "US"
                }
            },
            "gcp_gke_clusters": {
                "ts-us-e1-n2-gke": {
                    "region": "us-east1",
                    "location": "South Carolina",
                    "country": "US"
                },
                "ts-in-w1-gke": {
                    "region": "asia-south1",
                    "location": "Mumbai"
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_exact_match() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);

        match resolver.resolve("ts-us-e1-n1") {
            SetupMatch::Resolved(r) => {
                assert_eq!(r.cluster_id, "ts-us-e1-n1");
                assert_eq!(r.country.as_str(), "US");
                assert_eq!(r.provider, CloudProvider::Aws);
            }
            other => panic!("expected resolved, got {:?}", other),
        }
    }

    #[test]
    fn test_suffix_fallback() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);

        match resolver.resolve("ts-us-e1-n2") {
            SetupMatch::Resolved(r) => {
                assert_eq!(r.setup, "ts-us-e1-n2");
                assert_eq!(r.cluster_id, "ts-us-e1-n2-gke");
                assert_eq!(r.country.as_str(), "US");
            }
            other => panic!("expected resolved via suffix, got {:?}", other),
        }
    }

    #[test]
    fn test_case_insensitive_match() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);
        assert!(matches!(
            resolver.resolve("TS-US-E1-N1"),
            SetupMatch::Resolved(_)
        ));
    }

    #[test]
    fn test_missing_country_is_separate_bucket() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);
        assert!(matches!(
            resolver.resolve("ts-in-w1"),
            SetupMatch::MissingCountry { .. }
        ));
    }

    #[test]
    fn test_batch_aggregates_warnings() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);

        let report = resolver.resolve_all(&["ts-xx-1", "ts-us-e1-n2", "ts-in-w1"]);

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].country.as_str(), "US");
        assert_eq!(report.unresolved, vec!["ts-xx-1".to_string()]);
        assert_eq!(report.missing_country, vec!["ts-in-w1-gke (Mumbai)".to_string()]);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_empty_batch() {
        let table = cluster_table();
        let resolver = SetupResolver::new(&table);
        let report = resolver.resolve_all::<&str>(&[]);
        assert!(report.resolved.is_empty());
        assert!(!report.has_warnings());
    }
}
