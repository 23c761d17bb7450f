// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process country store with the backend's query semantics.
//!
//! Useful for embedding the directory without a backend and as a test
//! double: [`InMemorySource::set_offline`] makes every call fail like an
//! unreachable server, and [`InMemorySource::calls`] counts attempts.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::country::{Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt};
use super::traits::{CountrySource, SourceError};

const DEFAULT_LIMIT: u32 = 100;

pub struct InMemorySource {
    name: &'static str,
    data: DashMap<i64, Country>,
    next_id: AtomicI64,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicUsize,
    /// Serialises the name check and insert of `create`.
    writes: Mutex<()>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::named("memory")
    }

    #[must_use]
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            data: DashMap::new(),
            next_id: AtomicI64::new(1),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            writes: Mutex::new(()),
        }
    }

    /// Store a record as-is, assigning an ID if it has none. Returns the ID.
    pub fn insert(&self, mut country: Country) -> i64 {
        let id = match country.id {
            Some(id) => {
                self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        country.id = Some(id);
        self.data.insert(id, country);
        id
    }

    /// Make every subsequent call fail as if the server were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency` before answering
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of operations attempted against this source
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    async fn enter(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Transport {
                source_name: self.name,
                message: "connection refused".into(),
            });
        }
        Ok(())
    }

    fn not_found(&self) -> SourceError {
        SourceError::Status {
            source_name: self.name,
            status: 404,
            detail: Some("Country not found".into()),
        }
    }

    /// All records ordered by ID
    fn sorted(&self) -> Vec<Country> {
        let mut all: Vec<Country> = self.data.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|c| c.id);
        all
    }

    fn find_by_name(&self, name: &str) -> Option<Country> {
        self.data
            .iter()
            .find(|r| r.value().common_name() == name)
            .map(|r| r.value().clone())
    }

    fn insert_unique(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        let _write = self.writes.lock();
        if self.find_by_name(&draft.name).is_some() {
            return Err(SourceError::Status {
                source_name: self.name,
                status: 400,
                detail: Some("Country already exists".into()),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let country = Country::from_draft(id, draft);
        self.data.insert(id, country.clone());
        Ok(country)
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Unset, empty and zero filters are ignored, the way the backend treats them.
fn matches(country: &Country, params: &CountrySearch) -> bool {
    if let Some(name) = params.name.as_deref().filter(|n| !n.is_empty()) {
        if !contains_ignore_case(country.common_name(), name) {
            return false;
        }
    }
    if let Some(region) = params.region.as_deref().filter(|r| !r.is_empty()) {
        if country.region.as_deref() != Some(region) {
            return false;
        }
    }
    if let Some(capital) = params.capital.as_deref().filter(|c| !c.is_empty()) {
        match country.capital_display() {
            Some(cap) if contains_ignore_case(cap, capital) => {}
            _ => return false,
        }
    }
    if let Some(min) = params.min_population.filter(|m| *m > 0) {
        if !country.population.is_some_and(|p| p >= min) {
            return false;
        }
    }
    if let Some(max) = params.max_population.filter(|m| *m > 0) {
        if !country.population.is_some_and(|p| p <= max) {
            return false;
        }
    }
    true
}

#[async_trait]
impl CountrySource for InMemorySource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        self.enter().await?;
        Ok(self
            .sorted()
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        self.enter().await?;
        self.find_by_name(name).ok_or_else(|| self.not_found())
    }

    async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        self.enter().await?;
        let skip = params.skip.unwrap_or(0);
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        Ok(self
            .sorted()
            .into_iter()
            .filter(|c| matches(c, params))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        self.enter().await?;
        Ok(self
            .sorted()
            .into_iter()
            .filter(|c| c.region.as_deref() == Some(region))
            .collect())
    }

    async fn stats(&self) -> Result<CountryStats, SourceError> {
        self.enter().await?;
        let all = self.sorted();
        let populations: Vec<u64> = all.iter().filter_map(|c| c.population).collect();
        let total_population: u64 = populations.iter().sum();
        let average_population = if populations.is_empty() {
            0.0
        } else {
            total_population as f64 / populations.len() as f64
        };

        Ok(CountryStats {
            total_countries: all.len() as u64,
            total_population,
            average_population,
            regions: all
                .iter()
                .filter_map(|c| c.region.clone())
                .filter(|r| !r.is_empty())
                .collect(),
        })
    }

    async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.enter().await?;
        self.insert_unique(draft)
    }

    async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        self.enter().await?;
        let mut entry = self.data.get_mut(&id).ok_or_else(|| self.not_found())?;
        entry.apply(draft);
        Ok(entry.clone())
    }

    async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        self.enter().await?;
        self.data
            .remove(&id)
            .map(|_| DeleteReceipt { message: "Country deleted successfully".into() })
            .ok_or_else(|| self.not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemorySource {
        let store = InMemorySource::new();
        store.insert(Country::named("Nepal").with_region("Asia").with_population(29_609_623));
        store.insert(Country::named("Egypt").with_region("Africa").with_population(104_258_327));
        store.insert(Country::named("France").with_region("Europe").with_population(67_391_582));
        store.insert(Country::named("Japan").with_region("Asia"));
        store
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemorySource::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let store = seeded();

        let page = store.list(1, 2).await.unwrap();
        let names: Vec<&str> = page.iter().map(Country::common_name).collect();
        assert_eq!(names, vec!["Egypt", "France"]);

        assert!(store.list(10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_name_exact() {
        let store = seeded();
        assert_eq!(store.get_by_name("Nepal").await.unwrap().id, Some(1));

        let err = store.get_by_name("nepal").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Country not found");
    }

    #[tokio::test]
    async fn test_search_name_is_case_insensitive_substring() {
        let store = seeded();
        let found = store.search(&CountrySearch::default().name("FRA")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].common_name(), "France");
    }

    #[tokio::test]
    async fn test_search_combines_filters() {
        let store = seeded();

        let asia = store.search(&CountrySearch::default().region("Asia")).await.unwrap();
        assert_eq!(asia.len(), 2);

        // Japan has no population, so a lower bound excludes it
        let populous = store
            .search(&CountrySearch::default().region("Asia").population_between(Some(1), None))
            .await
            .unwrap();
        assert_eq!(populous.len(), 1);
        assert_eq!(populous[0].common_name(), "Nepal");

        // Empty strings and zero bounds are ignored
        let everything = store
            .search(&CountrySearch::default().name("").population_between(Some(0), Some(0)))
            .await
            .unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty_not_error() {
        let store = seeded();
        let found = store.search(&CountrySearch::default().name("xyz-no-match")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_stats_like_backend() {
        let store = seeded();
        let stats = store.stats().await.unwrap();

        assert_eq!(stats.total_countries, 4);
        assert_eq!(stats.total_population, 29_609_623 + 104_258_327 + 67_391_582);
        let expected_avg = stats.total_population as f64 / 3.0;
        assert!((stats.average_population - expected_avg).abs() < 1e-6);
        assert_eq!(stats.regions.len(), 3);
    }

    #[tokio::test]
    async fn test_stats_empty_store() {
        let stats = InMemorySource::new().stats().await.unwrap();
        assert_eq!(stats.total_countries, 0);
        assert_eq!(stats.average_population, 0.0);
        assert!(stats.regions.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let store = seeded();
        let err = store.create(&CountryDraft::new("Nepal")).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.user_message(), "Country already exists");

        let created = store.create(&CountryDraft::new("Peru")).await.unwrap();
        assert_eq!(created.id, Some(5));
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = seeded();
        let mut patch = CountryDraft::new("");
        patch.capital = Some("Kathmandu".into());

        let updated = store.update(1, &patch).await.unwrap();
        assert_eq!(updated.common_name(), "Nepal");
        assert_eq!(updated.capital_display(), Some("Kathmandu"));

        assert!(store.update(99, &patch).await.unwrap_err().is_not_found());

        let receipt = store.delete(1).await.unwrap();
        assert_eq!(receipt.message, "Country deleted successfully");
        assert!(store.delete(1).await.unwrap_err().is_not_found());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call_and_counts() {
        let store = seeded();
        store.set_offline(true);

        assert!(matches!(store.list(0, 10).await, Err(SourceError::Transport { .. })));
        assert!(store.stats().await.is_err());
        assert_eq!(store.calls(), 2);

        store.set_offline(false);
        assert!(store.list(0, 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_insert_keeps_explicit_ids_unique() {
        let store = InMemorySource::new();
        let mut country = Country::named("Chile");
        country.id = Some(10);
        assert_eq!(store.insert(country), 10);
        assert_eq!(store.insert(Country::named("Peru")), 11);
    }

    #[tokio::test]
    async fn test_insert_max_id_does_not_overflow() {
        let store = InMemorySource::new();
        let mut country = Country::named("Chile");
        country.id = Some(i64::MAX);

        assert_eq!(store.insert(country), i64::MAX);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_name("Chile").await.unwrap().id, Some(i64::MAX));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_creates_admit_one() {
        use std::sync::Arc;
        use tokio::sync::Barrier;

        let store = Arc::new(seeded());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = vec![];

        for _ in 0..8 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                store.create(&CountryDraft::new("Peru")).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(country) => {
                    assert_eq!(country.common_name(), "Peru");
                    created += 1;
                }
                Err(err) => assert_eq!(err.status(), Some(400)),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        use std::sync::Arc;

        let store = Arc::new(InMemorySource::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store_clone = store.clone();
            handles.push(tokio::spawn(async move {
                store_clone.create(&CountryDraft::new(format!("Country {}", i))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
