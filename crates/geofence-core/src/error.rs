//! Error types for geofence

use thiserror::Error;

/// Geofence error type
#[derive(Error, Debug)]
pub enum GeofenceError {
    /// Distribution, cluster entry, or channel does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Credentials missing or lacking permission
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Concurrency token no longer matches server state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Restriction config violates the mode/countries invariant
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure that survived the bounded retry budget
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// Missing or malformed reference data, credentials, or profile
    #[error("config error: {0}")]
    Config(String),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl GeofenceError {
    /// Returns true if this is a stale-token conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, GeofenceError::Conflict(_))
    }

    /// Returns true if this error is retryable
    ///
    /// Only transient network failures qualify. Conflict and Unauthorized are
    /// never retried automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeofenceError::TransientIo(_) => true,
            GeofenceError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type for geofence operations
pub type Result<T> = std::result::Result<T, GeofenceError>;
