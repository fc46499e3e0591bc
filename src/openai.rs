//! Minimal HTTP client for OpenAI-compatible APIs.
//!
//! Shared by the embeddings and chat completion backends. Every request is
//! a JSON `POST` with bearer authentication against the configured
//! `base_url`.
//!
//! # Retry Strategy
//!
//! Callers pass `max_retries` (0 by default in config, meaning one attempt):
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{ApiKey, OpenAiConfig};
use crate::error::{Error, Result};

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: ApiKey) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON response.
    pub async fn post_json<B, T>(
        &self,
        service: &'static str,
        path: &str,
        body: &B,
        max_retries: u32,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut last_err = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                debug!(service, attempt, ?delay, "retrying request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .bearer_auth(self.api_key.expose())
                .json(body)
                .send()
                .await;

            let response = match resp {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(service_error(service, format!("request failed: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<T>().await.map_err(|e| {
                    service_error(service, format!("failed to parse response: {}", e))
                });
            }

            let body_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body_text)
                .map(|e| e.error.message)
                .unwrap_or(body_text);
            let err = service_error(service, format!("API error {}: {}", status, detail));

            if status.as_u16() == 429 || status.is_server_error() {
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_err.unwrap_or_else(|| service_error(service, "failed after retries".into())))
    }
}

fn service_error(service: &'static str, message: String) -> Error {
    Error::Service { service, message }
}
