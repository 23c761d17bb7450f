// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search/filter reconciliation for the browsing view.
//!
//! The view prefers the backend's answer to a query and only filters
//! locally when the backend cannot be reached:
//!
//! - [`query`] holds the inputs ([`QueryState`], [`RegionFilter`]) and the
//!   pure [`local_filter`] predicate
//! - [`view`] holds [`DirectoryView`], which sequences dispatches so a slow
//!   answer to an old query can never overwrite the answer to a newer one

pub mod query;
pub mod view;

pub use query::{local_filter, QueryState, RegionFilter, ALL_REGIONS};
pub use view::{DirectoryView, Resolution, ViewPhase, ViewSnapshot};
