// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the country directory client.
//!
//! # Example
//!
//! ```
//! use country_directory::DirectoryConfig;
//!
//! // Minimal config (uses defaults)
//! let config = DirectoryConfig::default();
//! assert_eq!(config.primary_base_url, "http://localhost:8000/api/v1");
//! assert_eq!(config.default_page_limit, 100);
//!
//! // Point at a different backend, keep everything else
//! let config = DirectoryConfig {
//!     primary_base_url: "https://countries.internal/api/v1".into(),
//!     request_timeout_ms: 2_000,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::resilience::circuit_breaker::CircuitConfig;
use crate::resilience::fallback::{FallbackRules, Operation};
use crate::source::http::parse_base_url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    EmptyUrl { field: &'static str },
    #[error("default_page_limit must be at least 1")]
    ZeroPageLimit,
    #[error("{field} is not a usable base URL: {message}")]
    InvalidUrl { field: &'static str, message: String },
    #[error("unknown operation '{0}' in fallback_operations")]
    UnknownOperation(String),
    #[error("operation '{0}' cannot fall back to the public service")]
    FallbackNotAllowed(String),
    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Configuration for the directory client.
///
/// All fields have defaults matching a local development backend and the
/// public restcountries service.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the primary backend, including the API prefix
    #[serde(default = "default_primary_base_url")]
    pub primary_base_url: String,

    /// Base URL of the read-only public fallback service
    #[serde(default = "default_fallback_base_url")]
    pub fallback_base_url: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Page size used for the directory's base fetch
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u32,

    /// Primary circuit breaker
    #[serde(default = "default_circuit_failure_threshold")]
    pub circuit_failure_threshold: u32,
    #[serde(default = "default_circuit_success_threshold")]
    pub circuit_success_threshold: u32,
    #[serde(default = "default_circuit_recovery_ms")]
    pub circuit_recovery_ms: u64,

    /// Operations allowed to degrade to the fallback source
    #[serde(default = "default_fallback_operations")]
    pub fallback_operations: Vec<String>,
}

fn default_primary_base_url() -> String { "http://localhost:8000/api/v1".into() }
fn default_fallback_base_url() -> String { "https://restcountries.com/v3.1".into() }
fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_page_limit() -> u32 { 100 }
fn default_circuit_failure_threshold() -> u32 { 5 }
fn default_circuit_success_threshold() -> u32 { 2 }
fn default_circuit_recovery_ms() -> u64 { 30_000 }
fn default_fallback_operations() -> Vec<String> {
    vec![Operation::List.to_string(), Operation::GetByName.to_string()]
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            primary_base_url: default_primary_base_url(),
            fallback_base_url: default_fallback_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            default_page_limit: default_page_limit(),
            circuit_failure_threshold: default_circuit_failure_threshold(),
            circuit_success_threshold: default_circuit_success_threshold(),
            circuit_recovery_ms: default_circuit_recovery_ms(),
            fallback_operations: default_fallback_operations(),
        }
    }
}

impl DirectoryConfig {
    /// Check the config for values that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl { field: "primary_base_url" });
        }
        if self.fallback_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl { field: "fallback_base_url" });
        }
        parse_base_url("primary_base_url", &self.primary_base_url)?;
        parse_base_url("fallback_base_url", &self.fallback_base_url)?;
        if self.default_page_limit == 0 {
            return Err(ConfigError::ZeroPageLimit);
        }
        self.fallback_rules().map(|_| ())
    }

    /// Parse `fallback_operations` into a rule table.
    ///
    /// Only display operations may be listed; searches, statistics and
    /// writes always fail loudly when the primary is down.
    pub fn fallback_rules(&self) -> Result<FallbackRules, ConfigError> {
        let mut rules = FallbackRules::none();
        for name in &self.fallback_operations {
            let op: Operation = name
                .parse()
                .map_err(|_| ConfigError::UnknownOperation(name.clone()))?;
            if !op.is_display() {
                return Err(ConfigError::FallbackNotAllowed(name.clone()));
            }
            rules = rules.allow(op);
        }
        Ok(rules)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn circuit_config(&self) -> CircuitConfig {
        CircuitConfig {
            failure_threshold: self.circuit_failure_threshold,
            success_threshold: self.circuit_success_threshold,
            recovery_timeout: Duration::from_millis(self.circuit_recovery_ms),
            ..CircuitConfig::default()
        }
    }
}
