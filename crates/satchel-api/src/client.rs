// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the backend's current-user session endpoint.
//!
//! Handles the `Authorization` header, decodes the `{"data": ...}` envelope,
//! maps statuses onto [`SatchelError`], and retries transient failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use satchel_config::model::ApiConfig;
use satchel_core::{
    Adapter, AdapterType, AuthToken, HealthStatus, SatchelError, SessionPayload, SessionSource,
};
use serde_json::Value;
use tracing::{debug, warn};

/// Delay between attempts after a transient error.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Client for the session endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session_path: String,
    auth_scheme: String,
    max_retries: u32,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self, SatchelError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SatchelError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_path: config.session_path.clone(),
            auth_scheme: config.auth_scheme.clone(),
            max_retries: config.max_retries,
            timeout: config.timeout(),
        })
    }

    /// Returns the backend base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the absolute URL of the session endpoint.
    pub fn session_url(&self) -> String {
        format!("{}{}", self.base_url, self.session_path)
    }

    fn authorization(&self, token: &AuthToken) -> Result<HeaderValue, SatchelError> {
        let mut value = HeaderValue::from_str(&format!("{} {}", self.auth_scheme, token.expose()))
            .map_err(|e| SatchelError::Config(format!("invalid authorization header value: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Fetches the raw session body, retrying transient statuses.
    async fn fetch_session_body(&self, token: &AuthToken) -> Result<String, SatchelError> {
        let url = self.session_url();
        let authorization = self.authorization(token)?;
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying session fetch after transient error");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, authorization.clone())
                .send()
                .await
                .map_err(|e| self.transport_error(e))?;

            let status = response.status();
            debug!(status = %status, attempt, "session response received");

            if status.is_success() {
                return response.text().await.map_err(|e| self.transport_error(e));
            }

            let body = response.text().await.unwrap_or_default();

            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(SatchelError::Unauthorized {
                    message: format!("{status}: {}", summarize(&body)),
                });
            }

            let error = SatchelError::Server {
                status: status.as_u16(),
                message: summarize(&body),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }

            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| {
            SatchelError::Internal("session fetch failed after retries".into())
        }))
    }

    fn transport_error(&self, e: reqwest::Error) -> SatchelError {
        if e.is_timeout() {
            SatchelError::Timeout {
                duration: self.timeout,
            }
        } else {
            SatchelError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl Adapter for ApiClient {
    fn name(&self) -> &str {
        "backend-api"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionSource
    }

    async fn health_check(&self) -> Result<HealthStatus, SatchelError> {
        match self.client.get(&self.base_url).send().await {
            Ok(response) if response.status().is_server_error() => Ok(HealthStatus::Degraded(
                format!("backend returned {}", response.status()),
            )),
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl SessionSource for ApiClient {
    async fn fetch_session(&self, token: &AuthToken) -> Result<SessionPayload, SatchelError> {
        let body = self.fetch_session_body(token).await?;
        parse_session_body(&body)
    }
}

/// Decodes a session endpoint body.
///
/// The backend wraps the record in `{"data": ...}`; a body without `data`
/// is taken as the record itself.
pub fn parse_session_body(body: &str) -> Result<SessionPayload, SatchelError> {
    let value: Value = serde_json::from_str(body).map_err(|e| SatchelError::Decode {
        message: format!("session body is not JSON: {e}"),
        source: Some(Box::new(e)),
    })?;

    let data = match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    SessionPayload::from_value(data).map_err(|e| SatchelError::Decode {
        message: format!("session payload has an unexpected shape: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Returns true for statuses worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Keeps error bodies short enough for a log line.
fn summarize(body: &str) -> String {
    const LIMIT: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
