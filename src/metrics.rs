// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the country directory.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `country_directory_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `source`: primary, public, memory
//! - `operation`: list, get_by_name, search, ...
//! - `status`: success or an error kind (transport, status, ...)

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record the outcome of one call against a source
pub fn record_source_call(source: &str, operation: &str, status: &str) {
    counter!(
        "country_directory_source_calls_total",
        "source" => source.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record source request latency
pub fn record_latency(source: &str, operation: &str, duration: Duration) {
    histogram!(
        "country_directory_source_call_seconds",
        "source" => source.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a fallback activation (primary failed, fallback attempted)
pub fn record_fallback(operation: &str, reason: &str) {
    counter!(
        "country_directory_fallback_total",
        "operation" => operation.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a failure handed back to the caller
pub fn record_propagated_failure(operation: &str, kind: &str) {
    counter!(
        "country_directory_failures_total",
        "operation" => operation.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record circuit breaker call outcome
pub fn record_circuit_call(circuit: &str, outcome: &str) {
    counter!(
        "country_directory_circuit_breaker_calls_total",
        "circuit" => circuit.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record how a directory view produced its displayed collection
pub fn record_reconciliation(resolution: &str) {
    counter!(
        "country_directory_reconciliations_total",
        "resolution" => resolution.to_string()
    )
    .increment(1);
}

/// Record the size of a displayed collection
pub fn record_displayed(count: usize) {
    histogram!("country_directory_displayed_countries").record(count as f64);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    source: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(source: &'static str, operation: &'static str) -> Self {
        Self {
            source,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.source, self.operation, self.start.elapsed());
    }
}
