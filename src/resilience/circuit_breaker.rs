// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Circuit breaker pattern using recloser crate.
//!
//! Protects the client from hammering a primary backend that is down. While
//! the breaker is open, calls fail fast with [`SourceError::CircuitOpen`],
//! which the fallback routing treats like any other primary failure.
//!
//! States:
//! - Closed: Normal operation, requests pass through
//! - Open: Backend unhealthy, requests fail-fast without attempting
//! - HalfOpen: Testing if backend recovered, limited requests allowed
//!
//! Only upstream faults count towards tripping the breaker. A 404 or a
//! rejected create is a healthy backend answering, not an outage.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use recloser::{AsyncRecloser, Error as RecloserError, Recloser};
use tracing::{debug, warn};

use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt};
use crate::source::traits::{CountrySource, SourceError};

/// Error type for circuit-protected operations
#[derive(Debug, thiserror::Error)]
pub enum CircuitError<E> {
    /// The circuit breaker rejected the call (circuit is open)
    #[error("circuit breaker open, request rejected")]
    Rejected,

    /// The underlying operation failed
    #[error("operation failed: {0}")]
    Inner(#[source] E),
}

impl<E> From<RecloserError<E>> for CircuitError<E> {
    fn from(err: RecloserError<E>) -> Self {
        match err {
            RecloserError::Rejected => CircuitError::Rejected,
            RecloserError::Inner(e) => CircuitError::Inner(e),
        }
    }
}

/// Configuration for a circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Size of the call window examined before the circuit can trip
    pub failure_threshold: u32,
    /// Number of calls in half-open before deciding to close
    pub success_threshold: u32,
    /// How long to wait before attempting recovery (half-open)
    pub recovery_timeout: Duration,
    /// Failure ratio over the window that trips the circuit
    pub error_rate: f32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            recovery_timeout: Duration::from_secs(30),
            error_rate: 0.5,
        }
    }
}

impl CircuitConfig {
    /// Fast recovery for testing
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            failure_threshold: 2,
            success_threshold: 1,
            recovery_timeout: Duration::from_millis(50),
            error_rate: 0.5,
        }
    }
}

/// A named circuit breaker with metrics tracking
pub struct CircuitBreaker {
    name: String,
    inner: AsyncRecloser,

    calls_total: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    rejections: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitConfig) -> Self {
        let recloser = Recloser::custom()
            .error_rate(config.error_rate)
            .closed_len(config.failure_threshold as usize)
            .half_open_len(config.success_threshold as usize)
            .open_wait(config.recovery_timeout)
            .build();

        Self {
            name: name.into(),
            inner: recloser.into(),
            calls_total: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rejections: AtomicU64::new(0),
        }
    }

    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitConfig::default())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute an async operation through the circuit breaker
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.calls_total.fetch_add(1, Ordering::Relaxed);

        match self.inner.call(f()).await {
            Ok(result) => {
                self.successes.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_circuit_call(&self.name, "success");
                Ok(result)
            }
            Err(RecloserError::Rejected) => {
                self.rejections.fetch_add(1, Ordering::Relaxed);
                warn!(circuit = %self.name, "Circuit breaker rejected call (open)");
                crate::metrics::record_circuit_call(&self.name, "rejected");
                Err(CircuitError::Rejected)
            }
            Err(RecloserError::Inner(e)) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                debug!(circuit = %self.name, "Circuit call failed");
                crate::metrics::record_circuit_call(&self.name, "failure");
                Err(CircuitError::Inner(e))
            }
        }
    }

    #[must_use]
    pub fn calls_total(&self) -> u64 {
        self.calls_total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    /// Get failure rate (0.0 - 1.0)
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.calls_total();
        if total == 0 {
            return 0.0;
        }
        self.failures() as f64 / total as f64
    }
}

/// Whether an error means the upstream itself is unhealthy.
fn is_upstream_fault(err: &SourceError) -> bool {
    match err {
        SourceError::Transport { .. } | SourceError::Decode { .. } => true,
        SourceError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

/// A source whose calls pass through a circuit breaker.
pub struct CircuitSource<S> {
    inner: S,
    breaker: CircuitBreaker,
}

impl<S: CountrySource> CircuitSource<S> {
    pub fn new(inner: S, config: CircuitConfig) -> Self {
        let breaker = CircuitBreaker::new(inner.name(), config);
        Self { inner, breaker }
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn guard<T, Fut>(&self, fut: Fut) -> Result<T, SourceError>
    where
        Fut: Future<Output = Result<T, SourceError>> + Send,
        T: Send,
    {
        // Non-fault errors ride through the breaker as successes
        let outcome = self
            .breaker
            .call(|| async move {
                match fut.await {
                    Err(e) if is_upstream_fault(&e) => Err(e),
                    other => Ok(other),
                }
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(CircuitError::Inner(e)) => Err(e),
            Err(CircuitError::Rejected) => Err(SourceError::CircuitOpen {
                source_name: self.inner.name(),
            }),
        }
    }
}

#[async_trait]
impl<S: CountrySource> CountrySource for CircuitSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        self.guard(self.inner.list(skip, limit)).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        self.guard(self.inner.get_by_name(name)).await
    }

    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        self.guard(self.inner.search(params)).await
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        self.guard(self.inner.list_by_region(region)).await
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        self.guard(self.inner.stats()).await
    }

    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.guard(self.inner.create(draft)).await
    }

    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.guard(self.inner.update(id, draft)).await
    }

    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        self.guard(self.inner.delete(id)).await
    }
}
