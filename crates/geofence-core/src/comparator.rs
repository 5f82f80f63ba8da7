//! Restriction comparator
//!
//! Given the distribution's restriction config and a set of countries derived
//! from resolved clusters, computes which target countries are effectively
//! reachable and which clusters contributed each country.

use crate::resolver::ResolvedSetup;
use crate::{CountryCode, RestrictionConfig, RestrictionMode};

/// Reachable/blocked verdict for one target country
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub country: CountryCode,
    pub reachable: bool,
    /// Cluster identifiers that resolved to this country
    pub via_clusters: Vec<String>,
}

/// Comparator output for one evaluation
#[derive(Clone, Debug)]
pub struct ReachabilityReport {
    pub verdicts: Vec<Verdict>,
}

impl ReachabilityReport {
    /// True when the target set was empty (all setups unresolved): there was
    /// nothing to check, which is distinct from "all reachable"
    pub fn nothing_to_check(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn blocked(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| !v.reachable)
    }

    pub fn all_reachable(&self) -> bool {
        !self.verdicts.is_empty() && self.verdicts.iter().all(|v| v.reachable)
    }
}

/// Evaluate reachability of every country the resolved setups map to
///
/// - mode none: every target country is reachable
/// - allow list: reachable iff the country is a member of the configured set
/// - deny list: reachable iff the country is NOT a member
pub fn evaluate(config: &RestrictionConfig, resolved: &[ResolvedSetup]) -> ReachabilityReport {
    // Group contributing clusters per country, first-seen order
    let mut order: Vec<CountryCode> = Vec::new();
    let mut clusters_by_country: std::collections::HashMap<CountryCode, Vec<String>> =
        std::collections::HashMap::new();

    for setup in resolved {
        let via = clusters_by_country.entry(setup.country.clone()).or_default();
        if via.is_empty() {
            order.push(setup.country.clone());
        }
        if !via.contains(&setup.cluster_id) {
            via.push(setup.cluster_id.clone());
        }
    }

    let verdicts = order
        .into_iter()
        .map(|country| {
            let reachable = match config.mode {
                RestrictionMode::None => true,
                RestrictionMode::Allowlist => config.countries.contains(&country),
                RestrictionMode::Denylist => !config.countries.contains(&country),
            };
            let via_clusters = clusters_by_country.remove(&country).unwrap_or_default();
            Verdict {
                country,
                reachable,
                via_clusters,
            }
        })
        .collect();

    ReachabilityReport { verdicts }
}
