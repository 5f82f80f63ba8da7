//! Geofence core
//!
//! Reads and mutates the geo-restriction list of a CDN distribution and
//! cross-references which countries correspond to a set of deployment
//! clusters.
//!
//! # Components
//!
//! - [`tables`]: immutable country and cluster lookup tables
//! - [`resolver`]: setup identifier -> cluster -> country resolution
//! - [`comparator`]: reachable/blocked verdicts against a restriction config
//! - [`editor`]: pure state machine behind the interactive editor
//! - [`client`]: conditional read/write of the distribution's geo restriction
//! - [`channel`]: channel id -> deployment setup lookup
//!
//! All edits are staged in memory; nothing is written remotely until an
//! explicit apply, which is gated by the concurrency token returned at fetch
//! time. A stale token fails with [`GeofenceError::Conflict`] and is never
//! merged silently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub mod channel;
pub mod client;
pub mod comparator;
pub mod editor;
pub mod error;
pub mod resolver;
pub mod tables;

pub use error::{GeofenceError, Result};

// =============================================================================
// Core Types
// =============================================================================

/// ISO-like 2-letter country code, normalized to uppercase
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a country code, trimming whitespace and folding case
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.len() == 2 && trimmed.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(GeofenceError::Validation(format!(
                "invalid country code: {:?}",
                input
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = GeofenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = GeofenceError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

/// Restriction mode of a distribution
///
/// Wire names follow the CDN provider's vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestrictionMode {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "whitelist")]
    Allowlist,
    #[serde(rename = "blacklist")]
    Denylist,
}

impl RestrictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Allowlist => "allow list",
            Self::Denylist => "deny list",
        }
    }
}

impl fmt::Display for RestrictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geo-restriction configuration of one distribution
///
/// Invariant: `mode == None` implies `countries` is empty. Every mutation
/// path preserves this; [`RestrictionConfig::validate`] is the final gate
/// before a write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionConfig {
    pub mode: RestrictionMode,
    pub countries: BTreeSet<CountryCode>,
}

impl RestrictionConfig {
    /// Config with no restriction applied
    pub fn unrestricted() -> Self {
        Self {
            mode: RestrictionMode::None,
            countries: BTreeSet::new(),
        }
    }

    /// Build a config, rejecting an invariant violation up front
    pub fn new(mode: RestrictionMode, countries: BTreeSet<CountryCode>) -> Result<Self> {
        let config = Self { mode, countries };
        config.validate()?;
        Ok(config)
    }

    /// Check the mode/countries invariant
    pub fn validate(&self) -> Result<()> {
        if self.mode == RestrictionMode::None && !self.countries.is_empty() {
            return Err(GeofenceError::Validation(format!(
                "mode is none but {} countries are listed",
                self.countries.len()
            )));
        }
        Ok(())
    }

    /// Drop the restriction: mode becomes `None` and the set empties as one
    /// operation
    pub fn clear(&mut self) {
        self.mode = RestrictionMode::None;
        self.countries.clear();
    }

    pub fn is_unrestricted(&self) -> bool {
        self.mode == RestrictionMode::None
    }
}

impl Default for RestrictionConfig {
    fn default() -> Self {
        Self::unrestricted()
    }
}

/// Opaque version marker returned alongside a fetched config
///
/// Must be sent back unchanged on update; a stale value fails with
/// [`GeofenceError::Conflict`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalization() {
        let code = CountryCode::parse(" us ").unwrap();
        assert_eq!(code.as_str(), "US");
        assert_eq!(code, CountryCode::parse("US").unwrap());
    }

    #[test]
    fn test_country_code_rejects_garbage() {
        assert!(CountryCode::parse("USA").is_err());
        assert!(CountryCode::parse("U").is_err());
        assert!(CountryCode::parse("1A").is_err());
        assert!(CountryCode::parse("").is_err());
    }

    #[test]
    fn test_restriction_invariant() {
        let mut countries = BTreeSet::new();
        countries.insert(CountryCode::parse("US").unwrap());

        assert!(RestrictionConfig::new(RestrictionMode::None, countries.clone()).is_err());
        assert!(RestrictionConfig::new(RestrictionMode::Allowlist, countries).is_ok());
        assert!(RestrictionConfig::new(RestrictionMode::None, BTreeSet::new()).is_ok());
    }

    #[test]
    fn test_clear_is_atomic() {
        let mut countries = BTreeSet::new();
        countries.insert(CountryCode::parse("US").unwrap());
        countries.insert(CountryCode::parse("GB").unwrap());

        let mut config = RestrictionConfig::new(RestrictionMode::Denylist, countries).unwrap();
        config.clear();

        assert_eq!(config.mode, RestrictionMode::None);
        assert!(config.countries.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&RestrictionMode::Allowlist).unwrap(),
            "\"whitelist\""
        );
        assert_eq!(
            serde_json::to_string(&RestrictionMode::Denylist).unwrap(),
            "\"blacklist\""
        );
        assert_eq!(
            serde_json::to_string(&RestrictionMode::None).unwrap(),
            "\"none\""
        );
    }
}
