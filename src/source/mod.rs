// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upstream data sources.
//!
//! - [`PrimarySource`]: the project's backend, full operation set
//! - [`PublicSource`]: public read-only service, display operations only
//! - [`InMemorySource`]: in-process store with backend semantics

pub mod traits;
pub mod memory;
pub mod primary;
pub mod public;
pub(crate) mod http;

pub use traits::{CountrySource, SourceError};
pub use memory::InMemorySource;
pub use primary::PrimarySource;
pub use public::PublicSource;
