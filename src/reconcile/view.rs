// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The directory view state machine.
//!
//! ```text
//!   load() ──► list(0, limit) ──► baseline ──┐
//!                                            ▼
//!   apply(query) ── idle? ──yes──► displayed = baseline            (Display)
//!                    │
//!                    no ──► search(params) ──ok──► displayed = result  (Remote)
//!                                          └─err─► local_filter(held)  (LocalFilter)
//!
//!   any result whose token is older than the latest dispatch ──► dropped (Superseded)
//! ```
//!
//! Base loads are numbered separately, so a reload never invalidates a
//! search in flight. A load that lands while a query is active refreshes the
//! baseline only.
//!
//! A successful remote search replaces the held collection wholesale; no
//! local filtering runs on top of it. A later degraded filter therefore runs
//! over the last remote result rather than the baseline.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::client::CountryClient;
use crate::country::Country;
use crate::metrics;

use super::query::{local_filter, QueryState, RegionFilter};

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Idle query or completed base load: the baseline is displayed.
    Display,
    /// Remote search succeeded; its result is displayed verbatim.
    Remote,
    /// Remote search failed; the held collection was filtered locally.
    LocalFilter,
    /// The result was not allowed to write the display: a newer dispatch
    /// was issued first, or a base load landed while a query was active.
    Superseded,
}

impl Resolution {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::Remote => "remote",
            Self::LocalFilter => "local_filter",
            Self::Superseded => "superseded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// At least one fetch is outstanding.
    Loading,
    Ready,
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub phase: ViewPhase,
    pub query: QueryState,
    pub displayed: Vec<Country>,
    /// Outcome of the last dispatch that was allowed to write.
    pub last_resolution: Option<Resolution>,
}

#[derive(Debug, Default)]
struct ViewState {
    query: QueryState,
    /// Result of the last base load.
    baseline: Vec<Country>,
    /// Collection the degraded filter runs over: the baseline or the last
    /// successful remote result.
    held: Vec<Country>,
    displayed: Vec<Country>,
    last_resolution: Option<Resolution>,
}

/// Decrements the in-flight count when a fetch ends, including when its
/// future is dropped mid-flight.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Directory view over a [`CountryClient`].
///
/// Every query change takes a sequence token; only the holder of the newest
/// token may write the displayed collection. Base loads carry their own
/// counter and write the display only while the query is idle.
pub struct DirectoryView {
    client: CountryClient,
    state: RwLock<ViewState>,
    /// Newest dispatched display token.
    sequence: AtomicU64,
    /// Newest dispatched base-load token.
    load_sequence: AtomicU64,
    /// Set by [`teardown`](Self::teardown); no load may write afterwards.
    closed: AtomicBool,
    in_flight: AtomicUsize,
    /// Task spawned by the last [`dispatch`](Self::dispatch), aborted when superseded.
    pending: Mutex<Option<AbortHandle>>,
}

impl DirectoryView {
    #[must_use]
    pub fn new(client: CountryClient) -> Self {
        Self {
            client,
            state: RwLock::new(ViewState::default()),
            sequence: AtomicU64::new(0),
            load_sequence: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            pending: Mutex::new(None),
        }
    }

    fn next_token(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == token
    }

    /// Fetch the first page as the base collection.
    ///
    /// A failure leaves an empty collection (the error is logged by the
    /// client). A load never takes a display token, so it cannot invalidate
    /// a search in flight. The baseline is stored by the newest load; the
    /// display is written only if the query is idle when the load lands.
    pub async fn load(&self) -> Resolution {
        let load_token = self.load_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let limit = self.client.default_page_limit();

        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.client.list(0, limit).await
        };

        let countries = result.unwrap_or_else(|err| {
            warn!(error = %err, "Initial country load failed, showing an empty directory");
            Vec::new()
        });

        let mut state = self.state.write();
        if self.load_sequence.load(Ordering::SeqCst) != load_token {
            debug!(load_token, "Base load superseded by a newer load");
            return finish(Resolution::Superseded, None);
        }
        state.baseline = countries;

        if self.closed.load(Ordering::SeqCst) {
            debug!(load_token, "View torn down, base load discarded");
            return finish(Resolution::Superseded, None);
        }

        if !state.query.is_idle() {
            debug!(load_token, "Query active, base load refreshed the baseline only");
            return finish(Resolution::Superseded, None);
        }

        state.held = state.baseline.clone();
        state.displayed = state.baseline.clone();
        state.last_resolution = Some(Resolution::Display);
        info!(count = state.baseline.len(), "Country directory loaded");
        finish(Resolution::Display, Some(state.displayed.len()))
    }

    /// Replace both inputs and reconcile.
    pub async fn apply(&self, query: QueryState) -> Resolution {
        let token = {
            let mut state = self.state.write();
            state.query = query.clone();
            self.next_token()
        };

        if query.is_idle() {
            let mut state = self.state.write();
            if !self.is_current(token) {
                return finish(Resolution::Superseded, None);
            }
            state.held = state.baseline.clone();
            state.displayed = state.baseline.clone();
            state.last_resolution = Some(Resolution::Display);
            return finish(Resolution::Display, Some(state.displayed.len()));
        }

        let params = query.search_params();
        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.client.search(&params).await
        };

        let mut state = self.state.write();
        if !self.is_current(token) {
            debug!(token, search = %query.search, region = %query.region, "Search result superseded");
            return finish(Resolution::Superseded, None);
        }

        let resolution = match result {
            Ok(countries) => {
                state.held = countries.clone();
                state.displayed = countries;
                Resolution::Remote
            }
            Err(err) => {
                warn!(
                    error = %err,
                    search = %query.search,
                    region = %query.region,
                    "Remote search failed, filtering locally"
                );
                state.displayed = local_filter(&state.held, &query);
                Resolution::LocalFilter
            }
        };
        state.last_resolution = Some(resolution);
        finish(resolution, Some(state.displayed.len()))
    }

    /// Change the search term, keeping the region.
    pub async fn set_search(&self, search: impl Into<String>) -> Resolution {
        let mut query = self.query();
        query.search = search.into();
        self.apply(query).await
    }

    /// Change the region, keeping the search term.
    pub async fn set_region(&self, region: RegionFilter) -> Resolution {
        let mut query = self.query();
        query.region = region;
        self.apply(query).await
    }

    /// Run [`apply`](Self::apply) on a background task, aborting the task of
    /// the previous dispatch if it is still running.
    pub fn dispatch(self: &Arc<Self>, query: QueryState) -> JoinHandle<Resolution> {
        let view = Arc::clone(self);
        let handle = tokio::spawn(async move { view.apply(query).await });

        if let Some(previous) = self.pending.lock().replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Abort any background dispatch and discard every outstanding result.
    pub fn teardown(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
        self.closed.store(true, Ordering::SeqCst);
        // Invalidate tokens of futures the caller may still be polling.
        self.next_token();
    }

    #[must_use]
    pub fn phase(&self) -> ViewPhase {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            ViewPhase::Loading
        } else {
            ViewPhase::Ready
        }
    }

    #[must_use]
    pub fn query(&self) -> QueryState {
        self.state.read().query.clone()
    }

    #[must_use]
    pub fn displayed(&self) -> Vec<Country> {
        self.state.read().displayed.clone()
    }

    #[must_use]
    pub fn baseline_len(&self) -> usize {
        self.state.read().baseline.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        let state = self.state.read();
        ViewSnapshot {
            phase: self.phase(),
            query: state.query.clone(),
            displayed: state.displayed.clone(),
            last_resolution: state.last_resolution,
        }
    }

    #[must_use]
    pub fn client(&self) -> &CountryClient {
        &self.client
    }
}

fn finish(resolution: Resolution, displayed: Option<usize>) -> Resolution {
    metrics::record_reconciliation(resolution.as_str());
    if let Some(count) = displayed {
        metrics::record_displayed(count);
    }
    resolution
}
