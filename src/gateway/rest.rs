//! HTTP implementation of the gateway against a PostgREST-style backend.
//!
//! One URL path per collection; sorting via the `order` query parameter;
//! row targeting via `id=eq.{id}`. Transport failures and HTTP statuses are
//! normalized into [`RemoteError`] codes so nothing above this module ever
//! sees a reqwest type.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{codes, RemoteError};
use crate::record::Record;
use crate::settings::ScaffoldSettings;

use super::{RemoteDataGateway, SortSpec};

/// REST gateway with per-request timeout and bounded retry.
pub struct RestGateway {
    base_url: String,
    client: reqwest::Client,
    retry_count: u32,
    retry_delay: Duration,
}

impl RestGateway {
    /// Build a gateway for `base_url`, authenticating every request with
    /// the given API key as a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        settings: &ScaffoldSettings,
    ) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        let bearer: HeaderValue = format!("Bearer {}", api_key)
            .parse()
            .map_err(|_| RemoteError::new("API key contains invalid header bytes", codes::NETWORK))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Ask the backend to echo written rows back in the response body.
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::new(format!("Failed to build HTTP client: {}", e), codes::NETWORK))?;

        let base_url = base_url.into();
        tracing::info!(base_url = %base_url, "REST gateway ready");

        Ok(Self {
            base_url,
            client,
            retry_count: settings.retry_count,
            retry_delay: settings.retry_delay,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), collection)
    }

    /// Map a transport-level failure to a structured error.
    fn normalize_transport_error(e: &reqwest::Error, url: &str) -> RemoteError {
        if e.is_timeout() {
            RemoteError::new(format!("Request to {} timed out", url), codes::TIMEOUT)
        } else if e.is_connect() {
            RemoteError::new(
                format!("Could not connect to {}: {}", url, e),
                codes::NETWORK,
            )
        } else if e.is_decode() {
            RemoteError::new(
                format!("Unexpected response body from {}: {}", url, e),
                codes::DECODE,
            )
        } else {
            RemoteError::new(format!("Request to {} failed: {}", url, e), codes::NETWORK)
        }
    }

    /// Map a non-success HTTP status to a structured error, attaching the
    /// backend's error payload when it is JSON.
    fn normalize_status(status: StatusCode, body: &str, url: &str) -> RemoteError {
        let code = if status == StatusCode::NOT_FOUND {
            codes::NOT_FOUND.to_string()
        } else {
            status.as_u16().to_string()
        };
        let mut err = RemoteError::new(format!("HTTP {} from {}", status.as_u16(), url), code);
        if let Ok(details) = serde_json::from_str::<Value>(body) {
            // PostgREST error payloads carry a human message; prefer it.
            if let Some(message) = details.get("message").and_then(Value::as_str) {
                err.message = message.to_string();
            }
            err = err.with_details(details);
        }
        err
    }

    /// Send a request, retrying transport failures and 5xx responses with a
    /// fixed delay. 4xx responses are never retried.
    async fn send_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, RemoteError> {
        let mut last_err = RemoteError::new(format!("Request to {} not attempted", url), codes::NETWORK);

        for attempt in 0..=self.retry_count {
            if attempt > 0 {
                tracing::debug!(url, attempt, "retrying request");
                tokio::time::sleep(self.retry_delay).await;
            }

            match build().send().await {
                Err(e) => {
                    last_err = Self::normalize_transport_error(&e, url);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(|e| {
                        RemoteError::new(
                            format!("Failed to read response body from {}: {}", url, e),
                            codes::DECODE,
                        )
                    })?;
                    if status.is_success() {
                        return Ok(body);
                    }
                    let err = Self::normalize_status(status, &body, url);
                    if !status.is_server_error() {
                        return Err(err);
                    }
                    last_err = err;
                }
            }
        }

        tracing::warn!(url, error = %last_err, "request exhausted retries");
        Err(last_err)
    }

    /// Parse a write response: the backend returns either the written row
    /// or a one-element array of it.
    fn parse_written_row(body: &str, url: &str) -> Result<Record, RemoteError> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            RemoteError::new(format!("Invalid JSON from {}: {}", url, e), codes::DECODE)
        })?;
        match value {
            Value::Array(mut rows) if !rows.is_empty() => Ok(Record::from_value(rows.remove(0))),
            Value::Object(map) => Ok(Record::from(map)),
            _ => Err(RemoteError::new(
                format!("Write to {} returned no row", url),
                codes::DECODE,
            )),
        }
    }
}

#[async_trait::async_trait]
impl RemoteDataGateway for RestGateway {
    async fn list(
        &self,
        collection: &str,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Record>, RemoteError> {
        let url = self.collection_url(collection);
        let body = self
            .send_with_retry(
                || {
                    let mut req = self.client.get(&url);
                    if let Some(sort) = sort {
                        req = req.query(&[(
                            "order",
                            format!("{}.{}", sort.field, sort.direction.as_str()),
                        )]);
                    }
                    req
                },
                &url,
            )
            .await?;

        serde_json::from_str::<Vec<Record>>(&body).map_err(|e| {
            RemoteError::new(format!("Invalid row list from {}: {}", url, e), codes::DECODE)
        })
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record, RemoteError> {
        let url = self.collection_url(collection);
        let payload = record.as_value();
        let body = self
            .send_with_retry(|| self.client.post(&url).json(&payload), &url)
            .await?;
        Self::parse_written_row(&body, &url)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Record, RemoteError> {
        let url = self.collection_url(collection);
        let payload = patch.as_value();
        let id_filter = format!("eq.{}", id);
        let body = self
            .send_with_retry(
                || {
                    self.client
                        .patch(&url)
                        .query(&[("id", id_filter.as_str())])
                        .json(&payload)
                },
                &url,
            )
            .await?;

        // An empty array means the filter matched nothing.
        match Self::parse_written_row(&body, &url) {
            Ok(row) => Ok(row),
            Err(e) if e.code == codes::DECODE && body.trim() == "[]" => {
                Err(RemoteError::not_found(collection, id))
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let url = self.collection_url(collection);
        let id_filter = format!("eq.{}", id);
        let body = self
            .send_with_retry(
                || self.client.delete(&url).query(&[("id", id_filter.as_str())]),
                &url,
            )
            .await?;

        // With return=representation the backend echoes deleted rows; an
        // empty array means the id did not exist.
        if body.trim() == "[]" {
            return Err(RemoteError::not_found(collection, id));
        }
        Ok(())
    }
}
