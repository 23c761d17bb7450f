// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The resilient country data client.
//!
//! [`CountryClient`] is the single entry point the views talk to. It owns a
//! composed [`CountrySource`], by default:
//!
//! ```text
//! FallbackSource
//!   ├─ primary:  CircuitSource<PrimarySource>   (backend, all operations)
//!   └─ fallback: PublicSource                   (public service, display only)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use country_directory::{CountryClient, DirectoryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CountryClient::from_config(&DirectoryConfig::default())?;
//!
//! // Falls back to the public service if the backend is down
//! let first_page = client.list(0, 100).await?;
//! println!("{} countries", first_page.len());
//!
//! // Backend only: errors are reported, never masked
//! let stats = client.stats().await?;
//! println!("{} regions", stats.regions.len());
//! # Ok(())
//! # }
//! ```

mod api;

pub use api::skip_for;

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, DirectoryConfig};
use crate::resilience::circuit_breaker::CircuitSource;
use crate::resilience::fallback::{FallbackRules, FallbackSource};
use crate::source::{CountrySource, PrimarySource, PublicSource};

/// Uniform operation set over the primary and fallback sources.
///
/// Cheap to clone; clones share the same sources and circuit breaker.
#[derive(Clone)]
pub struct CountryClient {
    pub(super) source: Arc<dyn CountrySource>,
    pub(super) default_page_limit: u32,
}

impl CountryClient {
    /// Build the standard backend + public-service client.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config.fallback_rules()?;

        let primary = CircuitSource::new(
            PrimarySource::new(&config.primary_base_url, config.request_timeout())?,
            config.circuit_config(),
        );
        let fallback = PublicSource::new(&config.fallback_base_url, config.request_timeout())?;

        info!(
            primary = %config.primary_base_url,
            fallback = %config.fallback_base_url,
            "Country client configured"
        );

        Ok(Self::new(primary, fallback, rules).with_page_limit(config.default_page_limit))
    }

    /// Compose any two sources under the given fallback rules.
    pub fn new<P, F>(primary: P, fallback: F, rules: FallbackRules) -> Self
    where
        P: CountrySource + 'static,
        F: CountrySource + 'static,
    {
        Self::from_source(Arc::new(FallbackSource::new(primary, fallback, rules)))
    }

    /// Use an already composed source as-is.
    pub fn from_source(source: Arc<dyn CountrySource>) -> Self {
        Self {
            source,
            default_page_limit: 100,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.default_page_limit = limit.max(1);
        self
    }

    /// Page size used for a view's base fetch
    #[must_use]
    pub fn default_page_limit(&self) -> u32 {
        self.default_page_limit
    }
}
