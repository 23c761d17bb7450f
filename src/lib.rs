//! # Country Directory
//!
//! Data access and query reconciliation for a country-information directory
//! with an administrative CRUD panel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Views (DirectoryView, AdminPanel)          │
//! │  • Search box + region selector → QueryState               │
//! │  • Stats dashboard, create/edit form, delete confirmation  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CountryClient                         │
//! │  • Uniform operation set: list, get_by_name, search, ...   │
//! │  • Pagination arithmetic, draft validation                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FallbackSource                        │
//! │  • Primary first, per-operation fallback rules             │
//! │  • list / get_by_name degrade to the public service        │
//! │  • search / stats / writes fail loudly                     │
//! └─────────────────────────────────────────────────────────────┘
//!              │                                   │
//!              ▼                                   ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────┐
//! │ CircuitSource<PrimarySource>  │   │ PublicSource              │
//! │  • Backend REST API           │   │  • Public country service │
//! │  • Trips on upstream faults   │   │  • Display operations only│
//! └───────────────────────────────┘   └───────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use country_directory::{CountryClient, DirectoryConfig, DirectoryView, RegionFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DirectoryConfig {
//!         primary_base_url: "http://localhost:8000/api/v1".into(),
//!         ..Default::default()
//!     };
//!     let client = CountryClient::from_config(&config)?;
//!
//!     let view = DirectoryView::new(client);
//!     view.load().await;
//!
//!     // Remote search; local filtering only if the backend is down
//!     view.set_region(RegionFilter::Only("Asia".into())).await;
//!     for country in view.displayed() {
//!         println!("{}", country.common_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: [`CountryClient`], the single entry point for data
//! - [`source`]: The [`CountrySource`] trait and its backend, public and in-memory implementations
//! - [`resilience`]: Fallback routing and circuit breaking
//! - [`reconcile`]: Search/filter reconciliation for the directory view
//! - [`admin`]: Statistics and CRUD for the admin view
//! - [`country`]: Record, draft, search and statistics types
//! - [`config`]: [`DirectoryConfig`]
//! - [`metrics`]: Counters and histograms under the `country_directory_` prefix

pub mod config;
pub mod country;
pub mod source;
pub mod resilience;
pub mod client;
pub mod reconcile;
pub mod admin;
pub mod metrics;

pub use config::{ConfigError, DirectoryConfig};
pub use country::{
    Capital, Country, CountryDraft, CountryName, CountrySearch, CountryStats, DeleteReceipt,
    Flags, ValidationError,
};
pub use source::{CountrySource, InMemorySource, PrimarySource, PublicSource, SourceError};
pub use resilience::fallback::{FallbackRules, FallbackSource, Operation};
pub use resilience::circuit_breaker::{CircuitBreaker, CircuitConfig, CircuitError, CircuitSource};
pub use client::CountryClient;
pub use reconcile::{local_filter, DirectoryView, QueryState, RegionFilter, Resolution, ViewPhase, ViewSnapshot};
pub use admin::{AdminPanel, Confirm, CountryForm, DeleteOutcome, Notice, Submission};
pub use metrics::LatencyTimer;
