//! Channel delivery lookup
//!
//! Given a channel identifier, fetches its delivery document from the
//! delivery API and extracts every deployment "setup" string from the
//! arbitrarily nested response. The document shape is the provider's own and
//! is treated as opaque JSON here.

use crate::client::DEFAULT_MAX_RETRIES;
use crate::{GeofenceError, Result};
use reqwest::{header, StatusCode};
use std::time::Duration;
use url::Url;

/// Delivery API client
pub struct ChannelClient {
    base_url: String,
    http: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChannelClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let token = api_token.into();
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| GeofenceError::Config("API token is not a valid header value".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            http,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Fetch the channel's delivery document and pull out its setup strings
    pub async fn delivery_setups(&self, channel_id: &str) -> Result<Vec<String>> {
        let base = self.base_url.trim_end_matches('/');
        let url = Url::parse(&format!("{}/tsdelivery/{}", base, channel_id))?;

        let resp = self.get_with_retry(url).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                return Err(GeofenceError::NotFound(format!("channel {}", channel_id)))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeofenceError::Unauthorized(
                    "delivery API rejected the credentials".to_string(),
                ))
            }
            s if !s.is_success() => {
                return Err(GeofenceError::TransientIo(format!(
                    "delivery API returned {}",
                    s
                )))
            }
            _ => {}
        }

        let document: serde_json::Value = resp.json().await?;
        let setups = extract_setups(&document);
        tracing::info!(channel = %channel_id, setups = setups.len(), "extracted delivery setups");
        Ok(setups)
    }

    async fn get_with_retry(&self, url: Url) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            match self.http.get(url.clone()).send().await {
                Ok(resp)
                    if resp.status().is_server_error() && attempt < self.max_retries =>
                {
                    tracing::warn!(status = %resp.status(), attempt, "delivery API error, retrying");
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    tracing::warn!(error = %e, attempt, "delivery request failed, retrying");
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    return Err(GeofenceError::TransientIo(e.to_string()))
                }
                Err(e) => return Err(GeofenceError::Http(e)),
            }
            tokio::time::sleep(self.retry_delay * (1 << attempt)).await;
            attempt += 1;
        }
    }
}

/// Recursively collect every `"setup"` string value, deduplicated, in
/// document order
pub fn extract_setups(document: &serde_json::Value) -> Vec<String> {
    let mut setups = Vec::new();
    walk(document, &mut setups);
    setups
}

fn walk(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                if key == "setup" {
                    if let serde_json::Value::String(s) = child {
                        if !out.contains(s) {
                            out.push(s.clone());
                        }
                        continue;
                    }
                }
                walk(child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_setups_nested() {
        let document = json!({
            "channel": "ch-1",
            "deliveries": [
                { "setup": "ts-us-e1-n2", "profile": "hd" },
                { "backup": { "setup": "ts-in-w1" } }
            ],
            "metadata": { "setup": "ts-us-e1-n2" },
            "count": 3
        });

        let setups = extract_setups(&document);
        assert_eq!(setups, vec!["ts-us-e1-n2", "ts-in-w1"]);
    }

    #[test]
    fn test_extract_setups_ignores_non_strings() {
        let document = json!({
            "setup": 42,
            "inner": { "setup": ["not", "a", "string"] }
        });
        assert!(extract_setups(&document).is_empty());
    }

    #[test]
    fn test_extract_setups_empty_document() {
        assert!(extract_setups(&json!({})).is_empty());
        assert!(extract_setups(&json!(null)).is_empty());
    }
}
