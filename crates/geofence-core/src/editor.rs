//! Interactive editor state machine
//!
//! The console loop in the CLI is a thin shell around [`EditorSession`], a
//! pure state machine with a single transition function. Every mutation is
//! staged in memory against a baseline; nothing is written remotely until the
//! caller confirms a [`Transition::ConfirmApply`] and performs the network
//! update itself.

use crate::tables::CountryTable;
use crate::{CountryCode, RestrictionConfig, RestrictionMode};

/// One user action against the session
#[derive(Clone, Debug)]
pub enum EditAction {
    /// Add a country, given as a code or a full name
    Add(String),
    /// Remove a country, given as a code or a full name
    Remove(String),
    /// Switch the restriction mode; switching to `None` clears the set
    SetMode(RestrictionMode),
    /// Drop the restriction entirely: mode none, empty set
    ClearAll,
    /// Request the apply step
    Apply,
    /// Exit without any network write
    Discard,
}

/// Result of one transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Input was invalid; state unchanged
    Rejected(String),
    /// Idempotent no-op (already present / already absent); state unchanged
    Noop(String),
    /// In-memory state changed
    Staged(String),
    /// Apply requested: caller shows the diff, confirms, and writes
    ConfirmApply(RestrictionDiff),
    /// Terminal: session over
    Exit,
}

/// Difference between the baseline and the working config
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestrictionDiff {
    pub mode_change: Option<(RestrictionMode, RestrictionMode)>,
    pub added: Vec<CountryCode>,
    pub removed: Vec<CountryCode>,
}

impl RestrictionDiff {
    pub fn is_empty(&self) -> bool {
        self.mode_change.is_none() && self.added.is_empty() && self.removed.is_empty()
    }
}

/// One editing session over a fetched restriction config
pub struct EditorSession<'a> {
    countries: &'a CountryTable,
    baseline: RestrictionConfig,
    working: RestrictionConfig,
}

impl<'a> EditorSession<'a> {
    pub fn new(countries: &'a CountryTable, current: RestrictionConfig) -> Self {
        Self {
            countries,
            working: current.clone(),
            baseline: current,
        }
    }

    /// The staged (in-memory) config
    pub fn current(&self) -> &RestrictionConfig {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Single transition function of the editor state machine
    pub fn apply(&mut self, action: EditAction) -> Transition {
        match action {
            EditAction::Add(input) => self.add(&input),
            EditAction::Remove(input) => self.remove(&input),
            EditAction::SetMode(mode) => self.set_mode(mode),
            EditAction::ClearAll => {
                self.working.clear();
                Transition::Staged("all restrictions cleared".to_string())
            }
            EditAction::Apply => Transition::ConfirmApply(self.diff()),
            EditAction::Discard => Transition::Exit,
        }
    }

    /// Diff of the working config against the baseline
    pub fn diff(&self) -> RestrictionDiff {
        let mode_change = if self.working.mode != self.baseline.mode {
            Some((self.baseline.mode, self.working.mode))
        } else {
            None
        };
        let added = self
            .working
            .countries
            .difference(&self.baseline.countries)
            .cloned()
            .collect();
        let removed = self
            .baseline
            .countries
            .difference(&self.working.countries)
            .cloned()
            .collect();
        RestrictionDiff {
            mode_change,
            added,
            removed,
        }
    }

    /// Record a successful remote write: the working config becomes the new
    /// baseline
    pub fn mark_applied(&mut self) {
        self.baseline = self.working.clone();
    }

    /// Adopt freshly fetched server state as the new baseline, keeping the
    /// staged edits intact. Used after a conflict so a retried apply compares
    /// against what the server holds now.
    pub fn rebase(&mut self, fresh: RestrictionConfig) {
        self.baseline = fresh;
    }

    fn add(&mut self, input: &str) -> Transition {
        let Some(code) = self.countries.resolve(input) else {
            return Transition::Rejected(format!("country not found: {:?}", input.trim()));
        };
        if self.working.mode == RestrictionMode::None {
            return Transition::Rejected(
                "no restriction mode set; choose allow list or deny list first".to_string(),
            );
        }
        let name = self.countries.name_of(&code).to_string();
        if self.working.countries.insert(code.clone()) {
            Transition::Staged(format!("added {} ({})", name, code))
        } else {
            Transition::Noop(format!("{} ({}) is already in the list", name, code))
        }
    }

    fn remove(&mut self, input: &str) -> Transition {
        let Some(code) = self.countries.resolve(input) else {
            return Transition::Rejected(format!("country not found: {:?}", input.trim()));
        };
        let name = self.countries.name_of(&code).to_string();
        if self.working.countries.remove(&code) {
            Transition::Staged(format!("removed {} ({})", name, code))
        } else {
            Transition::Noop(format!("{} ({}) is not in the list", name, code))
        }
    }

    fn set_mode(&mut self, mode: RestrictionMode) -> Transition {
        if self.working.mode == mode {
            return Transition::Noop(format!("mode is already {}", mode));
        }
        if mode == RestrictionMode::None {
            self.working.clear();
        } else {
            self.working.mode = mode;
        }
        Transition::Staged(format!("mode set to {}", mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn countries() -> CountryTable {
        CountryTable::from_json(&json!({
            "country_codes": {
                "US": "United States",
                "GB": "United Kingdom",
                "SG": "Singapore"
            }
        }))
        .unwrap()
    }

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    fn allowlist(codes: &[&str]) -> RestrictionConfig {
        let set: BTreeSet<CountryCode> = codes.iter().map(|c| code(c)).collect();
        RestrictionConfig::new(RestrictionMode::Allowlist, set).unwrap()
    }

    #[test]
    fn test_add_unknown_country_rejected() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        let t = session.apply(EditAction::Add("Atlantis".to_string()));
        assert!(matches!(t, Transition::Rejected(_)));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_add_by_name_and_code() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        assert!(matches!(
            session.apply(EditAction::Add("united kingdom".to_string())),
            Transition::Staged(_)
        ));
        assert!(matches!(
            session.apply(EditAction::Add("sg".to_string())),
            Transition::Staged(_)
        ));
        assert!(session.current().countries.contains(&code("GB")));
        assert!(session.current().countries.contains(&code("SG")));
    }

    #[test]
    fn test_add_existing_is_noop_with_empty_diff() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        assert!(matches!(
            session.apply(EditAction::Add("US".to_string())),
            Transition::Noop(_)
        ));
        assert!(session.diff().is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop_with_empty_diff() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        assert!(matches!(
            session.apply(EditAction::Remove("GB".to_string())),
            Transition::Noop(_)
        ));
        assert!(session.diff().is_empty());
    }

    #[test]
    fn test_add_requires_a_mode() {
        let table = countries();
        let mut session = EditorSession::new(&table, RestrictionConfig::unrestricted());

        assert!(matches!(
            session.apply(EditAction::Add("US".to_string())),
            Transition::Rejected(_)
        ));

        session.apply(EditAction::SetMode(RestrictionMode::Allowlist));
        assert!(matches!(
            session.apply(EditAction::Add("US".to_string())),
            Transition::Staged(_)
        ));
    }

    #[test]
    fn test_clear_all_then_rebuild_round_trips() {
        let table = countries();
        let original = allowlist(&["US", "GB"]);
        let mut session = EditorSession::new(&table, original.clone());

        session.apply(EditAction::ClearAll);
        assert!(session.current().is_unrestricted());
        assert!(session.current().countries.is_empty());

        session.apply(EditAction::SetMode(RestrictionMode::Allowlist));
        session.apply(EditAction::Add("US".to_string()));
        session.apply(EditAction::Add("GB".to_string()));

        assert_eq!(session.current(), &original);
        assert!(session.diff().is_empty());
    }

    #[test]
    fn test_set_mode_none_clears_atomically() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US", "GB"]));

        session.apply(EditAction::SetMode(RestrictionMode::None));
        assert!(session.current().countries.is_empty());
        assert!(session.current().validate().is_ok());
    }

    #[test]
    fn test_apply_yields_full_diff() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US", "GB"]));

        session.apply(EditAction::Remove("GB".to_string()));
        session.apply(EditAction::Add("SG".to_string()));
        session.apply(EditAction::SetMode(RestrictionMode::Denylist));

        match session.apply(EditAction::Apply) {
            Transition::ConfirmApply(diff) => {
                assert_eq!(
                    diff.mode_change,
                    Some((RestrictionMode::Allowlist, RestrictionMode::Denylist))
                );
                assert_eq!(diff.added, vec![code("SG")]);
                assert_eq!(diff.removed, vec![code("GB")]);
            }
            other => panic!("expected ConfirmApply, got {:?}", other),
        }
    }

    #[test]
    fn test_mark_applied_resets_diff() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        session.apply(EditAction::Add("GB".to_string()));
        assert!(session.is_dirty());

        session.mark_applied();
        assert!(!session.is_dirty());
        assert!(session.diff().is_empty());
    }

    #[test]
    fn test_rebase_keeps_staged_edits() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));

        session.apply(EditAction::Add("GB".to_string()));

        // Server moved on concurrently: it now also lists SG
        session.rebase(allowlist(&["US", "SG"]));

        let diff = session.diff();
        assert_eq!(diff.added, vec![code("GB")]);
        // The staged config does not carry SG, so a re-apply would drop it;
        // the diff makes that visible to the user
        assert_eq!(diff.removed, vec![code("SG")]);
    }

    #[test]
    fn test_discard_is_terminal() {
        let table = countries();
        let mut session = EditorSession::new(&table, allowlist(&["US"]));
        assert_eq!(session.apply(EditAction::Discard), Transition::Exit);
    }
}
