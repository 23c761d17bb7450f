// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Country records and the request/response shapes around them.
//!
//! The two upstream sources disagree on shape: the backend sends `name` as a
//! plain string and `capital` as a single string, the public service sends
//! `name` as `{common, official}` and `capital` as a list. [`Country`]
//! accepts both, and [`CountryName::common`] is the one field that always
//! lines up across sources.
//!
//! # Example
//!
//! ```
//! use country_directory::Country;
//! use serde_json::json;
//!
//! let backend: Country = serde_json::from_value(json!({
//!     "id": 1, "name": "Nepal", "capital": "Kathmandu", "region": "Asia"
//! })).unwrap();
//! let public: Country = serde_json::from_value(json!({
//!     "name": {"common": "Nepal", "official": "Federal Democratic Republic of Nepal"},
//!     "capital": ["Kathmandu"], "region": "Asia"
//! })).unwrap();
//!
//! assert_eq!(backend.common_name(), public.common_name());
//! assert_eq!(backend.capital_display(), Some("Kathmandu"));
//! assert_eq!(public.capital_display(), Some("Kathmandu"));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

fn default_true() -> bool {
    true
}

/// `is_independent` may arrive as `null` from the backend; that still means independent.
fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Country name, either a bare string or the structured public-service form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountryName {
    Plain(String),
    Structured {
        common: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        official: Option<String>,
    },
}

impl CountryName {
    /// The display name, comparable across both sources.
    #[must_use]
    pub fn common(&self) -> &str {
        match self {
            Self::Plain(name) => name,
            Self::Structured { common, .. } => common,
        }
    }

    #[must_use]
    pub fn official(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Structured { official, .. } => official.as_deref(),
        }
    }
}

impl From<&str> for CountryName {
    fn from(name: &str) -> Self {
        Self::Plain(name.to_string())
    }
}

impl std::fmt::Display for CountryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.common())
    }
}

/// Capital city: one string from the backend, a list from the public service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Capital {
    One(String),
    Many(Vec<String>),
}

impl Capital {
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::One(capital) => Some(capital.as_str()),
            Self::Many(capitals) => capitals.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A country record as returned by either source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Backend-assigned ID (absent on public-service records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: CountryName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subregion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<Capital>,
    /// Backend flag image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_url: Option<String>,
    /// Public-service flag images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Flags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interesting_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_independent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    // Extras only the public detail projection carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tld: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currencies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<Vec<String>>,
}

impl Country {
    /// A bare record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: CountryName::Plain(name.into()),
            population: None,
            area: None,
            region: None,
            subregion: None,
            capital: None,
            flag_url: None,
            flags: None,
            interesting_fact: None,
            currency: None,
            language: None,
            timezone: None,
            is_independent: true,
            created_at: None,
            updated_at: None,
            tld: None,
            currencies: None,
            languages: None,
            borders: None,
        }
    }

    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }

    #[must_use]
    pub fn common_name(&self) -> &str {
        self.name.common()
    }

    #[must_use]
    pub fn capital_display(&self) -> Option<&str> {
        self.capital.as_ref().and_then(Capital::first)
    }

    /// Flag image reference from whichever source produced the record.
    #[must_use]
    pub fn flag(&self) -> Option<&str> {
        self.flag_url.as_deref().or_else(|| {
            self.flags
                .as_ref()
                .and_then(|f| f.png.as_deref().or(f.svg.as_deref()))
        })
    }

    /// Build a stored record from a draft (used by the in-memory source).
    pub(crate) fn from_draft(id: i64, draft: &CountryDraft) -> Self {
        let mut country = Self::named(draft.name.clone());
        country.id = Some(id);
        country.apply(draft);
        country
    }

    /// Overwrite the fields a draft provides; absent fields are left alone.
    pub(crate) fn apply(&mut self, draft: &CountryDraft) {
        if !draft.name.is_empty() {
            self.name = CountryName::Plain(draft.name.clone());
        }
        if let Some(capital) = &draft.capital {
            self.capital = Some(Capital::One(capital.clone()));
        }
        if draft.population.is_some() {
            self.population = draft.population;
        }
        if draft.area.is_some() {
            self.area = draft.area;
        }
        let text_fields = [
            (&mut self.region, &draft.region),
            (&mut self.subregion, &draft.subregion),
            (&mut self.flag_url, &draft.flag_url),
            (&mut self.interesting_fact, &draft.interesting_fact),
            (&mut self.currency, &draft.currency),
            (&mut self.language, &draft.language),
            (&mut self.timezone, &draft.timezone),
        ];
        for (field, value) in text_fields {
            if value.is_some() {
                field.clone_from(value);
            }
        }
        self.is_independent = draft.is_independent;
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("country name must not be empty")]
    EmptyName,
    #[error("area must be a non-negative number, got {0}")]
    InvalidArea(f64),
    #[error("page {page} with limit {limit} overflows the skip offset")]
    PageOverflow { page: u64, limit: u32 },
}

/// Create/update body for the backend.
///
/// Absent optional fields are not serialized, so an update only touches
/// the fields that are set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subregion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interesting_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_true")]
    pub is_independent: bool,
}

impl Default for CountryDraft {
    fn default() -> Self {
        Self::new("")
    }
}

impl CountryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capital: None,
            population: None,
            region: None,
            subregion: None,
            area: None,
            flag_url: None,
            interesting_fact: None,
            currency: None,
            language: None,
            timezone: None,
            is_independent: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(area) = self.area {
            if !area.is_finite() || area < 0.0 {
                return Err(ValidationError::InvalidArea(area));
            }
        }
        Ok(())
    }
}

/// Aggregate statistics, computed by the backend only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStats {
    pub total_countries: u64,
    pub total_population: u64,
    pub average_population: f64,
    pub regions: BTreeSet<String>,
}

/// Search parameters for the backend search endpoint.
///
/// Only keys that are set end up in the query string; an empty string is
/// still a value and is sent.
///
/// ```
/// use country_directory::CountrySearch;
///
/// let search = CountrySearch::default().region("Asia");
/// assert_eq!(search.to_query_string().unwrap(), "region=Asia");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_population: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CountrySearch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    #[must_use]
    pub fn population_between(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_population = min;
        self.max_population = max;
        self
    }

    /// URL-encoded query string of the keys that are set.
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }
}

/// Backend confirmation for a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReceipt {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_record_deserializes() {
        let country: Country = serde_json::from_value(json!({
            "id": 7,
            "name": "Egypt",
            "capital": "Cairo",
            "population": 104258327,
            "region": "Africa",
            "subregion": "Northern Africa",
            "area": 1001449.0,
            "flag_url": "https://flagcdn.com/w320/eg.png",
            "is_independent": null,
            "created_at": "2024-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(country.id, Some(7));
        assert_eq!(country.common_name(), "Egypt");
        assert_eq!(country.capital_display(), Some("Cairo"));
        assert_eq!(country.flag(), Some("https://flagcdn.com/w320/eg.png"));
        assert!(country.is_independent);
    }

    #[test]
    fn test_public_record_deserializes() {
        let country: Country = serde_json::from_value(json!({
            "name": {
                "common": "France",
                "official": "French Republic",
                "nativeName": {"fra": {"official": "République française", "common": "France"}}
            },
            "capital": ["Paris"],
            "population": 67391582,
            "region": "Europe",
            "flags": {"png": "https://flagcdn.com/w320/fr.png", "svg": "https://flagcdn.com/fr.svg"},
            "tld": [".fr"],
            "borders": ["AND", "BEL"]
        }))
        .unwrap();

        assert_eq!(country.id, None);
        assert_eq!(country.common_name(), "France");
        assert_eq!(country.name.official(), Some("French Republic"));
        assert_eq!(country.flag(), Some("https://flagcdn.com/w320/fr.png"));
        assert_eq!(country.borders.as_ref().map(Vec::len), Some(2));
        assert!(country.is_independent);
    }

    #[test]
    fn test_explicit_false_independence_kept() {
        let country: Country =
            serde_json::from_value(json!({"name": "Greenland", "is_independent": false})).unwrap();
        assert!(!country.is_independent);
    }

    #[test]
    fn test_plain_name_serializes_as_string() {
        let value = serde_json::to_value(Country::named("Peru")).unwrap();
        assert_eq!(value["name"], json!("Peru"));
        assert!(value.get("population").is_none());
    }

    #[test]
    fn test_draft_skips_unset_fields() {
        let mut draft = CountryDraft::new("Chile");
        draft.population = Some(19_000_000);

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value, json!({"name": "Chile", "population": 19000000, "is_independent": true}));
    }

    #[test]
    fn test_draft_validation() {
        assert_eq!(CountryDraft::new("   ").validate(), Err(ValidationError::EmptyName));

        let mut draft = CountryDraft::new("Chile");
        draft.area = Some(-1.0);
        assert_eq!(draft.validate(), Err(ValidationError::InvalidArea(-1.0)));

        draft.area = Some(756_102.0);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_apply_only_overwrites_provided_fields() {
        let mut draft = CountryDraft::new("Nepal");
        draft.capital = Some("Kathmandu".into());
        draft.region = Some("Asia".into());
        let mut country = Country::from_draft(1, &draft);

        let mut patch = CountryDraft::new("");
        patch.population = Some(30_000_000);
        country.apply(&patch);

        assert_eq!(country.common_name(), "Nepal");
        assert_eq!(country.capital_display(), Some("Kathmandu"));
        assert_eq!(country.region.as_deref(), Some("Asia"));
        assert_eq!(country.population, Some(30_000_000));
    }

    #[test]
    fn test_search_query_string_omits_unset_keys() {
        let search = CountrySearch { name: None, region: Some("Asia".into()), ..Default::default() };
        assert_eq!(search.to_query_string().unwrap(), "region=Asia");

        let search = CountrySearch::default().name("").region("Asia");
        assert_eq!(search.to_query_string().unwrap(), "name=&region=Asia");

        let search = CountrySearch::default().name("Côte d'Ivoire");
        assert_eq!(search.to_query_string().unwrap(), "name=C%C3%B4te+d%27Ivoire");
    }

    #[test]
    fn test_stats_regions_are_a_set() {
        let stats: CountryStats = serde_json::from_value(json!({
            "total_countries": 3,
            "total_population": 300,
            "average_population": 100.0,
            "regions": ["Asia", "Europe", "Asia"]
        }))
        .unwrap();
        assert_eq!(stats.regions.len(), 2);
    }
}
