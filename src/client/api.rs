//! Public operations of [`CountryClient`].
//!
//! Routing (which source, whether to fall back) lives in the composed
//! source. This layer does the caller-facing arithmetic and validation and
//! makes sure every failure that reaches the caller is logged once.

use std::future::Future;

use tracing::{debug, error};

use crate::country::{
    Country, CountryDraft, CountrySearch, CountryStats, DeleteReceipt, ValidationError,
};
use crate::metrics;
use crate::resilience::fallback::Operation;
use crate::source::SourceError;

use super::CountryClient;

/// Offset for a zero-based page: `page * limit`, or `None` on overflow.
///
/// ```
/// use country_directory::client::skip_for;
///
/// assert_eq!(skip_for(0, 100), Some(0));
/// assert_eq!(skip_for(3, 25), Some(75));
/// ```
#[must_use]
pub fn skip_for(page: u64, limit: u32) -> Option<u64> {
    page.checked_mul(u64::from(limit))
}

impl CountryClient {
    async fn observe<T, Fut>(&self, op: Operation, fut: Fut) -> Result<T, SourceError>
    where
        Fut: Future<Output = Result<T, SourceError>>,
    {
        match fut.await {
            Ok(value) => Ok(value),
            Err(err) => {
                error!(operation = %op, error = %err, "Country operation failed");
                metrics::record_propagated_failure(op.as_str(), err.kind());
                Err(err)
            }
        }
    }

    /// One page of countries. Falls back to the public service's full
    /// listing when the backend is unavailable.
    pub async fn list(&self, page: u64, limit: u32) -> Result<Vec<Country>, SourceError> {
        let skip = skip_for(page, limit).ok_or(ValidationError::PageOverflow { page, limit })?;
        debug!(page, limit, skip, "Listing countries");
        self.observe(Operation::List, self.source.list(skip, limit)).await
    }

    /// Single country by exact name.
    pub async fn get_by_name(&self, name: &str) -> Result<Country, SourceError> {
        self.observe(Operation::GetByName, self.source.get_by_name(name)).await
    }

    /// Backend search. Only the keys set in `params` are sent.
    pub async fn search(&self, params: &CountrySearch) -> Result<Vec<Country>, SourceError> {
        self.observe(Operation::Search, self.source.search(params)).await
    }

    pub async fn list_by_region(&self, region: &str) -> Result<Vec<Country>, SourceError> {
        self.observe(Operation::ListByRegion, self.source.list_by_region(region)).await
    }

    /// Aggregate statistics, always computed by the backend.
    pub async fn stats(&self) -> Result<CountryStats, SourceError> {
        self.observe(Operation::Stats, self.source.stats()).await
    }

    /// Create a country. The draft is validated before any request is made.
    pub async fn create(&self, draft: &CountryDraft) -> Result<Country, SourceError> {
        draft.validate()?;
        self.observe(Operation::Create, self.source.create(draft)).await
    }

    /// Update a country. The draft is validated before any request is made.
    pub async fn update(&self, id: i64, draft: &CountryDraft) -> Result<Country, SourceError> {
        draft.validate()?;
        self.observe(Operation::Update, self.source.update(id, draft)).await
    }

    pub async fn delete(&self, id: i64) -> Result<DeleteReceipt, SourceError> {
        self.observe(Operation::Delete, self.source.delete(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::resilience::fallback::FallbackRules;
    use crate::source::InMemorySource;

    fn client() -> (CountryClient, Arc<InMemorySource>, Arc<InMemorySource>) {
        let primary = Arc::new(InMemorySource::named("primary"));
        for (name, region) in [("Nepal", "Asia"), ("Egypt", "Africa"), ("France", "Europe")] {
            primary.insert(Country::named(name).with_region(region));
        }
        let fallback = Arc::new(InMemorySource::named("public"));
        fallback.insert(Country::named("Japan").with_region("Asia"));

        let client = CountryClient::new(
            primary.clone(),
            fallback.clone(),
            FallbackRules::default(),
        );
        (client, primary, fallback)
    }

    #[test]
    fn test_skip_for() {
        assert_eq!(skip_for(2, 50), Some(100));
        assert_eq!(skip_for(u64::MAX, 2), None);
        assert_eq!(skip_for(u64::MAX, 0), Some(0));
    }

    #[tokio::test]
    async fn test_list_uses_page_times_limit() {
        let (client, _, _) = client();
        let page = client.list(1, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].common_name(), "France");
    }

    #[tokio::test]
    async fn test_list_overflow_makes_no_call() {
        let (client, primary, fallback) = client();
        let err = client.list(u64::MAX, 100).await.unwrap_err();
        assert!(matches!(err, SourceError::Invalid(ValidationError::PageOverflow { .. })));
        assert_eq!(primary.calls() + fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_falls_back_when_primary_down() {
        let (client, primary, fallback) = client();
        primary.set_offline(true);

        let countries = client.list(0, 100).await.unwrap();
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].common_name(), "Japan");
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_never_uses_fallback() {
        let (client, primary, fallback) = client();
        primary.set_offline(true);

        let err = client.search(&CountrySearch::default().name("ja")).await.unwrap_err();
        assert!(matches!(err, SourceError::Transport { source_name: "primary", .. }));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_call() {
        let (client, primary, _) = client();

        let err = client.create(&CountryDraft::new("")).await.unwrap_err();
        assert!(matches!(err, SourceError::Invalid(ValidationError::EmptyName)));
        let err = client.update(1, &CountryDraft::new(" ")).await.unwrap_err();
        assert!(matches!(err, SourceError::Invalid(ValidationError::EmptyName)));
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_crud_round() {
        let (client, primary, _) = client();

        let created = client.create(&CountryDraft::new("Peru")).await.unwrap();
        let id = created.id.unwrap();

        let mut patch = CountryDraft::new("Peru");
        patch.capital = Some("Lima".into());
        let updated = client.update(id, &patch).await.unwrap();
        assert_eq!(updated.capital_display(), Some("Lima"));

        client.delete(id).await.unwrap();
        assert!(client.get_by_name("Peru").await.unwrap_err().is_not_found());
        assert_eq!(primary.len(), 3);
    }

    #[tokio::test]
    async fn test_region_and_stats_come_from_primary() {
        let (client, _, fallback) = client();

        let asia = client.list_by_region("Asia").await.unwrap();
        assert_eq!(asia.len(), 1);
        assert_eq!(client.stats().await.unwrap().total_countries, 3);
        assert_eq!(fallback.calls(), 0);
    }
}
