// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search/filter inputs and the local predicate filter.
//!
//! # Example
//!
//! ```rust
//! use country_directory::{Country, QueryState, RegionFilter, local_filter};
//!
//! let countries = vec![
//!     Country::named("France").with_region("Europe"),
//!     Country::named("Frankfurt Free State").with_region("Asia"),
//!     Country::named("Japan").with_region("Asia"),
//! ];
//!
//! let query = QueryState::new("fra", "Europe".parse::<RegionFilter>().unwrap());
//! let hits = local_filter(&countries, &query);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].common_name(), "France");
//! ```

use std::convert::Infallible;
use std::str::FromStr;

use crate::country::{Country, CountrySearch};

/// Sentinel value of the region selector meaning "no region filter".
pub const ALL_REGIONS: &str = "all";

/// Region selector value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    #[must_use]
    pub fn matches(&self, country: &Country) -> bool {
        match self {
            Self::All => true,
            Self::Only(region) => country.region.as_deref() == Some(region.as_str()),
        }
    }

    #[must_use]
    pub fn as_region(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(region) => Some(region),
        }
    }
}

impl FromStr for RegionFilter {
    type Err = Infallible;

    /// `"all"` and the empty selection both mean no filter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ALL_REGIONS | "" => Self::All,
            region => Self::Only(region.to_string()),
        })
    }
}

impl std::fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_region().unwrap_or(ALL_REGIONS))
    }
}

/// The live search inputs of a directory view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub search: String,
    pub region: RegionFilter,
}

impl QueryState {
    pub fn new(search: impl Into<String>, region: RegionFilter) -> Self {
        Self { search: search.into(), region }
    }

    /// No search term and no region: show the base collection as-is.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.search.is_empty() && self.region == RegionFilter::All
    }

    /// Remote search parameters: the term as `name` if non-empty and the
    /// region if one is selected. Nothing else is sent.
    #[must_use]
    pub fn search_params(&self) -> CountrySearch {
        CountrySearch {
            name: Some(self.search.clone()).filter(|s| !s.is_empty()),
            region: self.region.as_region().map(str::to_string),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn matches(&self, country: &Country) -> bool {
        let name_ok = self.search.is_empty()
            || country
                .common_name()
                .to_lowercase()
                .contains(&self.search.to_lowercase());
        name_ok && self.region.matches(country)
    }
}

/// Degraded-mode filter: case-insensitive substring on the common name and
/// exact match on region, applied to whatever collection is held.
#[must_use]
pub fn local_filter(collection: &[Country], query: &QueryState) -> Vec<Country> {
    collection.iter().filter(|c| query.matches(c)).cloned().collect()
}
