// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Shared HTTP plumbing for the REST-backed sources.

use std::time::Duration;

use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ConfigError;
use crate::metrics::LatencyTimer;
use crate::resilience::fallback::Operation;
use super::traits::SourceError;

/// Base URL + client for one upstream.
pub(crate) struct HttpTransport {
    name: &'static str,
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub(crate) fn new(
        name: &'static str,
        field: &'static str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let base = parse_base_url(field, base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { name, client, base })
    }

    pub(crate) fn name(&self) -> &'static str {
        self.name
    }

    /// Base URL with `segments` appended as percent-encoded path segments.
    /// An empty final segment yields a trailing slash.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse_base_url guarantees a base-capable URL
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        op: Operation,
        url: Url,
    ) -> Result<T, SourceError> {
        self.send::<T, ()>(op, Method::GET, url, None).await
    }

    pub(crate) async fn send<T, B>(
        &self,
        op: Operation,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let _timer = LatencyTimer::new(self.name, op.as_str());
        debug!(source = self.name, operation = %op, %method, %url, "Sending request");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| self.transport(e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, SourceError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport(e))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name,
                status: status.as_u16(),
                detail: error_detail(&bytes),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            source_name: self.name,
            message: e.to_string(),
        })
    }

    fn transport(&self, err: reqwest::Error) -> SourceError {
        SourceError::Transport {
            source_name: self.name,
            message: err.to_string(),
        }
    }
}

pub(crate) fn parse_base_url(field: &'static str, base_url: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
        field,
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            field,
            message: "not a base URL".into(),
        });
    }
    Ok(url)
}

/// Pull `detail` out of an error body. FastAPI-style backends send either a
/// string or a list of validation problems.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
