// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read-only public country service (restcountries v3.1 shape).
//!
//! Only the display operations have an equivalent here. Everything else is
//! answered with [`SourceError::Unsupported`] without touching the network.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ConfigError;
use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt};
use crate::resilience::fallback::Operation;
use super::http::HttpTransport;
use super::traits::{CountrySource, SourceError};

/// Field projection for the full listing.
pub const LIST_FIELDS: &str = "name,population,region,capital,flags";

/// Field projection for a single-country detail lookup.
pub const DETAIL_FIELDS: &str =
    "name,population,region,subregion,capital,tld,currencies,languages,borders,flags";

pub struct PublicSource {
    http: HttpTransport,
}

impl PublicSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpTransport::new("public", "fallback_base_url", base_url, timeout)?,
        })
    }

    fn unsupported(&self, operation: Operation) -> SourceError {
        SourceError::Unsupported { source_name: self.name(), operation }
    }
}

#[async_trait]
impl CountrySource for PublicSource {
    fn name(&self) -> &'static str {
        self.http.name()
    }

    /// The public service has no paging; the whole projection is returned.
    async fn list(&self, _skip: u64, _limit: u32) -> Result<Vec<Country>, SourceError> {
        let mut url = self.http.endpoint(&["all"]);
        url.set_query(Some(&format!("fields={}", LIST_FIELDS)));
        self.http.get(Operation::List, url).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        let mut url = self.http.endpoint(&["name", name]);
        url.set_query(Some(&format!("fullText=true&fields={}", DETAIL_FIELDS)));

        let matches: Vec<Country> = self.http.get(Operation::GetByName, url).await?;
        matches.into_iter().next().ok_or(SourceError::Status {
            source_name: self.name(),
            status: 404,
            detail: Some("Country not found".into()),
        })
    }

    async fn search(&self, _params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        Err(self.unsupported(Operation::Search))
    }

    async fn list_by_region(&self, _region: &str) -> Result<Vec<Country>, SourceError> {
        Err(self.unsupported(Operation::ListByRegion))
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        Err(self.unsupported(Operation::Stats))
    }

    async fn create(&self, _draft: &CountryDraft) -> Result<Country, SourceError> {
        Err(self.unsupported(Operation::Create))
    }

    async fn update(&self, _id: i64, _draft: &CountryDraft) -> Result<Country, SourceError> {
        Err(self.unsupported(Operation::Update))
    }

    async fn delete(&self, _id: i64) -> Result<DeleteReceipt, SourceError> {
        Err(self.unsupported(Operation::Delete))
    }
}
