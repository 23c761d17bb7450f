// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt, ValidationError};
use crate::resilience::fallback::Operation;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{source_name} unreachable: {message}")]
    Transport { source_name: &'static str, message: String },
    #[error("{source_name} returned HTTP {status}")]
    Status {
        source_name: &'static str,
        status: u16,
        /// `detail` field of the error body, when the server sent one
        detail: Option<String>,
    },
    #[error("{source_name} sent an unreadable body: {message}")]
    Decode { source_name: &'static str, message: String },
    #[error("{operation} is not supported by {source_name}")]
    Unsupported { source_name: &'static str, operation: Operation },
    #[error("circuit breaker open for {source_name}, request rejected")]
    CircuitOpen { source_name: &'static str },
    #[error("invalid request: {0}")]
    Invalid(#[from] ValidationError),
    #[error("could not encode query: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

impl SourceError {
    /// Text suitable for a user-facing alert: the server's detail message
    /// if it sent one, otherwise the error itself.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { detail: Some(detail), .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Unsupported { .. } => "unsupported",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::Invalid(_) => "invalid",
            Self::Encode(_) => "encode",
        }
    }
}

/// One upstream provider of country data.
///
/// Every source exposes the full operation set; a source that cannot serve
/// an operation answers with [`SourceError::Unsupported`].
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError>;
    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError>;
    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError>;
    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError>;
    async fn stats(&self) -> Result<CountryStats, SourceError>;
    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError>;
    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError>;
    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError>;
}

/// Shared sources, so a caller can keep a handle on a source it composed.
#[async_trait]
impl<S: CountrySource + ?Sized> CountrySource for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        (**self).list(skip, limit).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        (**self).get_by_name(name).await
    }

    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        (**self).search(params).await
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        (**self).list_by_region(region).await
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        (**self).stats().await
    }

    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        (**self).create(draft).await
    }

    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        (**self).delete(id).await
    }
}
