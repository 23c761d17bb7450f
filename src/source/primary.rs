// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The project's own backend, authoritative for writes and advanced queries.
//!
//! ```text
//! GET    /countries/?skip=&limit=      list
//! GET    /countries/name/{name}        get_by_name
//! GET    /countries/search?{params}    search
//! GET    /countries/region/{region}    list_by_region
//! GET    /countries/stats/overview     stats
//! POST   /countries/                   create
//! PUT    /countries/{id}               update
//! DELETE /countries/{id}               delete
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::config::ConfigError;
use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt};
use crate::resilience::fallback::Operation;
use super::http::HttpTransport;
use super::traits::{CountrySource, SourceError};

pub struct PrimarySource {
    http: HttpTransport,
}

impl PrimarySource {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpTransport::new("primary", "primary_base_url", base_url, timeout)?,
        })
    }
}

#[async_trait]
impl CountrySource for PrimarySource {
    fn name(&self) -> &'static str {
        self.http.name()
    }

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        let mut url = self.http.endpoint(&["countries", ""]);
        url.query_pairs_mut()
            .append_pair("skip", &skip.to_string())
            .append_pair("limit", &limit.to_string());
        self.http.get(Operation::List, url).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        let url = self.http.endpoint(&["countries", "name", name]);
        self.http.get(Operation::GetByName, url).await
    }

    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        let query = params.to_query_string()?;
        let mut url = self.http.endpoint(&["countries", "search"]);
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        self.http.get(Operation::Search, url).await
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        let url = self.http.endpoint(&["countries", "region", region]);
        self.http.get(Operation::ListByRegion, url).await
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        let url = self.http.endpoint(&["countries", "stats", "overview"]);
        self.http.get(Operation::Stats, url).await
    }

    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        let url = self.http.endpoint(&["countries", ""]);
        self.http.send(Operation::Create, Method::POST, url, Some(draft)).await
    }

    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        let url = self.http.endpoint(&["countries", &id.to_string()]);
        self.http.send(Operation::Update, Method::PUT, url, Some(draft)).await
    }

    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        let url = self.http.endpoint(&["countries", &id.to_string()]);
        self.http
            .send::<_, ()>(Operation::Delete, Method::DELETE, url, None)
            .await
    }
}
