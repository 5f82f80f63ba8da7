//! Distribution config client
//!
//! Conditional read/write of one distribution's geo-restriction field. The
//! read returns the config together with an opaque concurrency token (the
//! response ETag); the write sends the token back via `If-Match` and fails
//! with [`GeofenceError::Conflict`] when the server state moved on.
//!
//! Only transient network failures are retried, a bounded number of times
//! with exponential backoff. Conflict and Unauthorized surface immediately.

use crate::{ConcurrencyToken, CountryCode, GeofenceError, RestrictionConfig, Result};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default max retries for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Identity and status of a distribution, for display
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub id: String,
    pub domain_name: String,
    pub status: String,
}

/// One fetched snapshot: summary, restriction config, and the token that must
/// accompany any write derived from it
#[derive(Clone, Debug)]
pub struct DistributionState {
    pub summary: DistributionSummary,
    pub restriction: RestrictionConfig,
    pub token: ConcurrencyToken,
}

/// Read/write seam over the CDN distribution API
///
/// The interactive editor and the commands are written against this trait so
/// they can be exercised with an in-memory implementation.
#[async_trait]
pub trait DistributionApi {
    /// Fetch the current geo restriction and concurrency token
    async fn fetch(&self, distribution_id: &str) -> Result<DistributionState>;

    /// Conditionally replace the geo restriction
    ///
    /// Fails with `Conflict` when `token` no longer matches server state;
    /// the caller must re-fetch and let a human decide. Returns the token of
    /// the written state.
    async fn update(
        &self,
        distribution_id: &str,
        config: &RestrictionConfig,
        token: &ConcurrencyToken,
    ) -> Result<ConcurrencyToken>;
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct GeoRestrictionWire {
    restriction_type: crate::RestrictionMode,
    quantity: usize,
    #[serde(default)]
    items: Vec<CountryCode>,
}

impl From<&RestrictionConfig> for GeoRestrictionWire {
    fn from(config: &RestrictionConfig) -> Self {
        Self {
            restriction_type: config.mode,
            quantity: config.countries.len(),
            items: config.countries.iter().cloned().collect(),
        }
    }
}

impl GeoRestrictionWire {
    fn into_config(self) -> Result<RestrictionConfig> {
        RestrictionConfig::new(self.restriction_type, self.items.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct DistributionWire {
    id: String,
    #[serde(default)]
    domain_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    geo_restriction: Option<GeoRestrictionWire>,
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Configuration for the CDN client
#[derive(Debug, Clone)]
pub struct CdnClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for CdnClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// CDN distribution API client
pub struct CdnClient {
    config: CdnClientConfig,
    http: reqwest::Client,
}

impl CdnClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        Self::with_config(CdnClientConfig {
            base_url: base_url.into(),
            api_token: api_token.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: CdnClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_token))
                .map_err(|_| GeofenceError::Config("API token is not a valid header value".into()))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    fn distribution_url(&self, distribution_id: &str, suffix: &str) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{}/distributions/{}{}",
            base, distribution_id, suffix
        ))?)
    }

    /// Send with a bounded transient-retry loop
    async fn send_with_retry(&self, build: impl Fn() -> reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            match build().send().await {
                Ok(resp) if resp.status().is_server_error() && attempt < self.config.max_retries => {
                    tracing::warn!(status = %resp.status(), attempt, "server error, retrying");
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.config.max_retries => {
                    tracing::warn!(error = %e, attempt, "transient network error, retrying");
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    return Err(GeofenceError::TransientIo(e.to_string()));
                }
                Err(e) => return Err(GeofenceError::Http(e)),
            }
            tokio::time::sleep(self.config.retry_delay * (1 << attempt)).await;
            attempt += 1;
        }
    }

    async fn error_from_response(
        &self,
        resp: reqwest::Response,
        distribution_id: &str,
    ) -> GeofenceError {
        let status = resp.status();
        let detail = resp
            .text()
            .await
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::NOT_FOUND => {
                GeofenceError::NotFound(format!("distribution {}", distribution_id))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GeofenceError::Unauthorized(detail)
            }
            StatusCode::PRECONDITION_FAILED => GeofenceError::Conflict(format!(
                "distribution {} was modified since it was fetched",
                distribution_id
            )),
            StatusCode::BAD_REQUEST => GeofenceError::Validation(detail),
            s if s.is_server_error() => GeofenceError::TransientIo(detail),
            _ => GeofenceError::TransientIo(format!("unexpected status {}: {}", status, detail)),
        }
    }

    fn token_from(resp: &reqwest::Response) -> Result<ConcurrencyToken> {
        resp.headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(ConcurrencyToken::new)
            .ok_or_else(|| {
                GeofenceError::TransientIo("response carried no concurrency token".into())
            })
    }
}

#[async_trait]
impl DistributionApi for CdnClient {
    async fn fetch(&self, distribution_id: &str) -> Result<DistributionState> {
        let url = self.distribution_url(distribution_id, "")?;
        let resp = self.send_with_retry(|| self.http.get(url.clone())).await?;

        if !resp.status().is_success() {
            return Err(self.error_from_response(resp, distribution_id).await);
        }

        let token = Self::token_from(&resp)?;
        let wire: DistributionWire = resp.json().await?;

        let restriction = match wire.geo_restriction {
            Some(geo) => geo.into_config()?,
            None => RestrictionConfig::unrestricted(),
        };

        tracing::info!(
            distribution = %distribution_id,
            mode = %restriction.mode,
            countries = restriction.countries.len(),
            "fetched geo restriction"
        );

        Ok(DistributionState {
            summary: DistributionSummary {
                id: wire.id,
                domain_name: wire.domain_name.unwrap_or_else(|| "unknown".to_string()),
                status: wire.status.unwrap_or_else(|| "unknown".to_string()),
            },
            restriction,
            token,
        })
    }

    async fn update(
        &self,
        distribution_id: &str,
        config: &RestrictionConfig,
        token: &ConcurrencyToken,
    ) -> Result<ConcurrencyToken> {
        // Invariant gate before any network I/O
        config.validate()?;

        let url = self.distribution_url(distribution_id, "/geo-restriction")?;
        let body = GeoRestrictionWire::from(config);

        let resp = self
            .send_with_retry(|| {
                self.http
                    .put(url.clone())
                    .header(header::IF_MATCH, token.as_str())
                    .json(&body)
            })
            .await?;

        if !resp.status().is_success() {
            return Err(self.error_from_response(resp, distribution_id).await);
        }

        tracing::info!(distribution = %distribution_id, "geo restriction updated");
        Self::token_from(&resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestrictionMode;
    use std::collections::BTreeSet;
    use tokio::sync::Mutex;

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).unwrap()
    }

    fn allowlist(codes: &[&str]) -> RestrictionConfig {
        let set: BTreeSet<CountryCode> = codes.iter().map(|c| code(c)).collect();
        RestrictionConfig::new(RestrictionMode::Allowlist, set).unwrap()
    }

    /// In-memory server: config + version counter acting as the token
    struct MockApi {
        state: Mutex<(RestrictionConfig, u64)>,
    }

    impl MockApi {
        fn new(config: RestrictionConfig) -> Self {
            Self {
                state: Mutex::new((config, 1)),
            }
        }

        /// Simulate a concurrent external update
        async fn external_update(&self, config: RestrictionConfig) {
            let mut state = self.state.lock().await;
            state.0 = config;
            state.1 += 1;
        }
    }

    #[async_trait]
    impl DistributionApi for MockApi {
        async fn fetch(&self, distribution_id: &str) -> Result<DistributionState> {
            if distribution_id == "E-MISSING" {
                return Err(GeofenceError::NotFound(format!(
                    "distribution {}",
                    distribution_id
                )));
            }
            let state = self.state.lock().await;
            Ok(DistributionState {
                summary: DistributionSummary {
                    id: distribution_id.to_string(),
                    domain_name: "d111.cdn.example.net".to_string(),
                    status: "Deployed".to_string(),
                },
                restriction: state.0.clone(),
                token: ConcurrencyToken::new(state.1.to_string()),
            })
        }

        async fn update(
            &self,
            distribution_id: &str,
            config: &RestrictionConfig,
            token: &ConcurrencyToken,
        ) -> Result<ConcurrencyToken> {
            config.validate()?;
            let mut state = self.state.lock().await;
            if token.as_str() != state.1.to_string() {
                return Err(GeofenceError::Conflict(format!(
                    "distribution {} was modified since it was fetched",
                    distribution_id
                )));
            }
            state.0 = config.clone();
            state.1 += 1;
            Ok(ConcurrencyToken::new(state.1.to_string()))
        }
    }

    #[tokio::test]
    async fn test_update_with_fresh_token_succeeds() {
        let api = MockApi::new(allowlist(&["US"]));
        let state = api.fetch("E123").await.unwrap();

        let new_config = allowlist(&["US", "GB"]);
        let new_token = api.update("E123", &new_config, &state.token).await.unwrap();

        let after = api.fetch("E123").await.unwrap();
        assert_eq!(after.restriction, new_config);
        assert_eq!(after.token, new_token);
    }

    #[tokio::test]
    async fn test_stale_token_is_conflict() {
        let api = MockApi::new(allowlist(&["US"]));
        let state = api.fetch("E123").await.unwrap();

        // Concurrent writer changes server state after our fetch
        api.external_update(allowlist(&["US", "IN"])).await;

        let result = api.update("E123", &allowlist(&["US", "GB"]), &state.token).await;
        assert!(matches!(result, Err(GeofenceError::Conflict(_))));

        // Server state is untouched by the failed write
        let after = api.fetch("E123").await.unwrap();
        assert_eq!(after.restriction, allowlist(&["US", "IN"]));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_write() {
        let api = MockApi::new(allowlist(&["US"]));
        let state = api.fetch("E123").await.unwrap();

        let mut bad = allowlist(&["US"]);
        bad.mode = RestrictionMode::None; // set still populated

        let result = api.update("E123", &bad, &state.token).await;
        assert!(matches!(result, Err(GeofenceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_distribution_is_not_found() {
        let api = MockApi::new(allowlist(&["US"]));
        let result = api.fetch("E-MISSING").await;
        assert!(matches!(result, Err(GeofenceError::NotFound(_))));
    }

    #[test]
    fn test_wire_round_trip() {
        let config = allowlist(&["GB", "US"]);
        let wire = GeoRestrictionWire::from(&config);
        assert_eq!(wire.quantity, 2);

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["restriction_type"], "whitelist");

        let parsed: GeoRestrictionWire = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.into_config().unwrap(), config);
    }

    #[test]
    fn test_wire_rejects_invariant_violation() {
        let wire: GeoRestrictionWire = serde_json::from_value(serde_json::json!({
            "restriction_type": "none",
            "quantity": 1,
            "items": ["US"]
        }))
        .unwrap();
        assert!(wire.into_config().is_err());
    }
}
