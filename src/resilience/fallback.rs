// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Primary/fallback source composition.
//!
//! [`FallbackSource`] is itself a [`CountrySource`]: every operation goes to
//! the primary first, and only operations permitted by [`FallbackRules`]
//! are retried against the fallback when the primary fails.
//!
//! ```text
//! operation(args)
//!       │
//!       ├─→ primary.operation(args)
//!       │        │
//!       │        └─→ Ok? Return
//!       │
//!       ├─→ rules.permits(operation)?
//!       │        │
//!       │        └─→ No: return primary error unchanged
//!       │
//!       └─→ warn + metric, fallback.operation(args) (its result is final)
//! ```

use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt};
use crate::metrics;
use crate::source::traits::{CountrySource, SourceError};

/// The operations the client exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    GetByName,
    Search,
    ListByRegion,
    Stats,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Self::List,
        Self::GetByName,
        Self::Search,
        Self::ListByRegion,
        Self::Stats,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GetByName => "get_by_name",
            Self::Search => "search",
            Self::ListByRegion => "list_by_region",
            Self::Stats => "stats",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Read-only operations whose results are only displayed.
    #[must_use]
    pub fn is_display(self) -> bool {
        matches!(self, Self::List | Self::GetByName)
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

/// Which operations may be served by the fallback source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackRules {
    allowed: u8,
}

impl Default for FallbackRules {
    /// Display operations only.
    fn default() -> Self {
        Operation::ALL
            .into_iter()
            .filter(|op| op.is_display())
            .fold(Self::none(), Self::allow)
    }
}

impl FallbackRules {
    /// No operation ever falls back.
    #[must_use]
    pub fn none() -> Self {
        Self { allowed: 0 }
    }

    #[must_use]
    pub fn allow(self, op: Operation) -> Self {
        Self { allowed: self.allowed | op.bit() }
    }

    #[must_use]
    pub fn deny(self, op: Operation) -> Self {
        Self { allowed: self.allowed & !op.bit() }
    }

    #[must_use]
    pub fn permits(&self, op: Operation) -> bool {
        self.allowed & op.bit() != 0
    }
}

/// A primary source backed by a fallback source for permitted operations.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    rules: FallbackRules,
}

impl<P, F> FallbackSource<P, F>
where
    P: CountrySource,
    F: CountrySource,
{
    pub fn new(primary: P, fallback: F, rules: FallbackRules) -> Self {
        Self { primary, fallback, rules }
    }

    #[must_use]
    pub fn rules(&self) -> FallbackRules {
        self.rules
    }

    #[must_use]
    pub fn primary(&self) -> &P {
        &self.primary
    }

    #[must_use]
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    async fn route<T, PFut, FFut, G>(
        &self,
        op: Operation,
        primary: PFut,
        fallback: G,
    ) -> Result<T, SourceError>
    where
        PFut: Future<Output = Result<T, SourceError>> + Send,
        G: FnOnce() -> FFut + Send,
        FFut: Future<Output = Result<T, SourceError>> + Send,
        T: Send,
    {
        let err = match primary.await {
            Ok(value) => {
                metrics::record_source_call(self.primary.name(), op.as_str(), "success");
                return Ok(value);
            }
            Err(err) => err,
        };
        metrics::record_source_call(self.primary.name(), op.as_str(), err.kind());

        if !self.rules.permits(op) {
            debug!(operation = %op, source = self.primary.name(), error = %err, "No fallback permitted");
            return Err(err);
        }

        warn!(
            operation = %op,
            primary = self.primary.name(),
            fallback = self.fallback.name(),
            error = %err,
            "Primary source unavailable, falling back"
        );
        metrics::record_fallback(op.as_str(), err.kind());

        let result = fallback().await;
        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_source_call(self.fallback.name(), op.as_str(), status);
        result
    }
}

#[async_trait]
impl<P, F> CountrySource for FallbackSource<P, F>
where
    P: CountrySource,
    F: CountrySource,
{
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        self.route(Operation::List, self.primary.list(skip, limit), || {
            self.fallback.list(skip, limit)
        })
        .await
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        self.route(Operation::GetByName, self.primary.get_by_name(name), || {
            self.fallback.get_by_name(name)
        })
        .await
    }

    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        self.route(Operation::Search, self.primary.search(params), || {
            self.fallback.search(params)
        })
        .await
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        self.route(Operation::ListByRegion, self.primary.list_by_region(region), || {
            self.fallback.list_by_region(region)
        })
        .await
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        self.route(Operation::Stats, self.primary.stats(), || self.fallback.stats())
            .await
    }

    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.route(Operation::Create, self.primary.create(draft), || {
            self.fallback.create(draft)
        })
        .await
    }

    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.route(Operation::Update, self.primary.update(id, draft), || {
            self.fallback.update(id, draft)
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        self.route(Operation::Delete, self.primary.delete(id), || {
            self.fallback.delete(id)
        })
        .await
    }
}
