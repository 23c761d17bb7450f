// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Administrative operations: statistics dashboard and country CRUD.
//!
//! Each submission is an immutable [`CountryForm`]. Whether it creates or
//! updates is decided by [`Submission::decide`] from the presence of an id,
//! so there is no edit-mode flag to get out of sync with the form.
//!
//! ```text
//!   CountryForm ──► Submission::decide ──► Create(draft)      ──► client.create
//!                                     └──► Update{id, draft}  ──► client.update
//!                                                  │
//!                                      ok ──► reload stats ──► Notice::Success
//!                                      err ─────────────────► Notice::Error("Error: ...")
//! ```

use std::fmt;

use tracing::{info, warn};

use crate::client::CountryClient;
use crate::country::{Country, CountryDraft, CountryStats};
use crate::source::SourceError;

pub const CREATED: &str = "Country created successfully!";
pub const UPDATED: &str = "Country updated successfully!";
pub const DELETED: &str = "Country deleted successfully!";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this country?";

/// One submission of the create/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryForm {
    /// Id of the record being edited; `None` for a new record.
    pub id: Option<i64>,
    pub draft: CountryDraft,
}

impl CountryForm {
    /// Empty form for a new country.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            id: None,
            draft: CountryDraft::default(),
        }
    }

    /// Form prefilled from an existing record.
    #[must_use]
    pub fn edit(country: &Country) -> Self {
        let draft = CountryDraft {
            name: country.common_name().to_string(),
            capital: country.capital_display().map(str::to_string),
            population: country.population,
            region: country.region.clone(),
            subregion: country.subregion.clone(),
            area: country.area,
            flag_url: country.flag_url.clone(),
            interesting_fact: country.interesting_fact.clone(),
            currency: country.currency.clone(),
            language: country.language.clone(),
            timezone: country.timezone.clone(),
            is_independent: country.is_independent,
        };
        Self { id: country.id, draft }
    }

    #[must_use]
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }
}

/// What a form submission turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(CountryDraft),
    Update { id: i64, draft: CountryDraft },
}

impl Submission {
    #[must_use]
    pub fn decide(form: CountryForm) -> Self {
        match form.id {
            Some(id) => Self::Update { id, draft: form.draft },
            None => Self::Create(form.draft),
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Self::Create(_) => CREATED,
            Self::Update { .. } => UPDATED,
        }
    }
}

/// User-facing alert text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    fn failure(err: &SourceError) -> Self {
        Self::Error(format!("Error: {}", err.user_message()))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Asks the user a yes/no question before a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Cancelled,
    Done(Notice),
}

/// Admin view state: the stats dashboard and the open form, if any.
pub struct AdminPanel {
    client: CountryClient,
    stats: Option<CountryStats>,
    form: Option<CountryForm>,
}

impl AdminPanel {
    #[must_use]
    pub fn new(client: CountryClient) -> Self {
        Self {
            client,
            stats: None,
            form: None,
        }
    }

    /// Fetch the statistics overview. On failure the previous figures stay.
    pub async fn load_stats(&mut self) -> Result<&CountryStats, SourceError> {
        match self.client.stats().await {
            Ok(stats) => Ok(self.stats.insert(stats)),
            Err(err) => {
                warn!(error = %err, "Failed to load statistics");
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> Option<&CountryStats> {
        self.stats.as_ref()
    }

    pub fn open_create(&mut self) -> &CountryForm {
        self.form.insert(CountryForm::blank())
    }

    pub fn open_edit(&mut self, country: &Country) -> &CountryForm {
        self.form.insert(CountryForm::edit(country))
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    #[must_use]
    pub fn form(&self) -> Option<&CountryForm> {
        self.form.as_ref()
    }

    /// Create or update, then refresh the statistics.
    ///
    /// The form stays open on failure so the user can correct it.
    pub async fn submit(&mut self, form: CountryForm) -> Notice {
        let submission = Submission::decide(form);
        let result = match &submission {
            Submission::Create(draft) => self.client.create(draft).await,
            Submission::Update { id, draft } => self.client.update(*id, draft).await,
        };

        match result {
            Ok(country) => {
                info!(id = ?country.id, name = %country.common_name(), "Country saved");
                self.form = None;
                self.refresh_stats().await;
                Notice::Success(submission.success_message().to_string())
            }
            Err(err) => Notice::failure(&err),
        }
    }

    /// Delete after confirmation. Declining sends nothing.
    pub async fn delete(&mut self, id: i64, confirm: &dyn Confirm) -> DeleteOutcome {
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Cancelled;
        }

        match self.client.delete(id).await {
            Ok(_) => {
                info!(id, "Country deleted");
                self.refresh_stats().await;
                DeleteOutcome::Done(Notice::Success(DELETED.to_string()))
            }
            Err(err) => DeleteOutcome::Done(Notice::failure(&err)),
        }
    }

    // A stats failure after a successful write is logged, not reported as
    // a failed write.
    async fn refresh_stats(&mut self) {
        let _ = self.load_stats().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::resilience::fallback::FallbackRules;
    use crate::source::InMemorySource;

    fn panel() -> (AdminPanel, Arc<InMemorySource>, Arc<InMemorySource>) {
        let primary = Arc::new(InMemorySource::named("primary"));
        primary.insert(Country::named("Nepal").with_region("Asia").with_population(30_000_000));
        primary.insert(Country::named("Egypt").with_region("Africa").with_population(110_000_000));
        let fallback = Arc::new(InMemorySource::named("public"));
        let client = CountryClient::new(primary.clone(), fallback.clone(), FallbackRules::default());
        (AdminPanel::new(client), primary, fallback)
    }

    #[test]
    fn test_decide_keys_on_id() {
        let create = Submission::decide(CountryForm::blank());
        assert!(matches!(create, Submission::Create(_)));

        let mut country = Country::named("Chad");
        country.id = Some(7);
        match Submission::decide(CountryForm::edit(&country)) {
            Submission::Update { id, draft } => {
                assert_eq!(id, 7);
                assert_eq!(draft.name, "Chad");
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_prefill() {
        let mut country = Country::named("Bhutan").with_region("Asia").with_population(780_000);
        country.id = Some(3);
        country.is_independent = false;

        let form = CountryForm::edit(&country);
        assert!(form.is_edit());
        assert_eq!(form.draft.region.as_deref(), Some("Asia"));
        assert_eq!(form.draft.population, Some(780_000));
        assert!(!form.draft.is_independent);

        let form = CountryForm::edit(&Country::named("Fiji"));
        assert!(form.draft.is_independent);
        assert!(!form.is_edit());
    }

    #[tokio::test]
    async fn test_create_reloads_stats() {
        let (mut panel, _, _) = panel();
        assert_eq!(panel.load_stats().await.unwrap().total_countries, 2);

        let mut form = CountryForm::blank();
        form.draft.name = "Peru".into();
        form.draft.region = Some("Americas".into());

        let notice = panel.submit(form).await;
        assert_eq!(notice, Notice::Success(CREATED.into()));
        let stats = panel.stats().unwrap();
        assert_eq!(stats.total_countries, 3);
        assert!(stats.regions.contains("Americas"));
    }

    #[tokio::test]
    async fn test_update_notice() {
        let (mut panel, primary, _) = panel();
        let id = primary.insert(Country::named("Chile"));
        let mut country = Country::named("Chile");
        country.id = Some(id);

        panel.open_edit(&country);
        let mut form = panel.form().cloned().unwrap();
        form.draft.capital = Some("Santiago".into());

        assert_eq!(panel.submit(form).await, Notice::Success(UPDATED.into()));
        assert!(panel.form().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_reports_server_detail() {
        let (mut panel, _, _) = panel();
        panel.open_create();
        let mut form = CountryForm::blank();
        form.draft.name = "Nepal".into();

        let notice = panel.submit(form).await;
        assert_eq!(notice, Notice::Error("Error: Country already exists".into()));
        assert!(panel.form().is_some());
    }

    #[tokio::test]
    async fn test_write_failure_when_backend_down_never_succeeds() {
        let (mut panel, primary, fallback) = panel();
        primary.set_offline(true);

        let mut form = CountryForm::blank();
        form.draft.name = "Peru".into();
        let notice = panel.submit(form).await;

        assert!(notice.is_error());
        assert_eq!(notice.message(), "Error: primary unreachable: connection refused");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let (mut panel, primary, fallback) = panel();
        let asked = std::cell::Cell::new(None::<String>);
        let decline = |prompt: &str| {
            asked.set(Some(prompt.to_string()));
            false
        };

        assert_eq!(panel.delete(1, &decline).await, DeleteOutcome::Cancelled);
        assert_eq!(asked.take().as_deref(), Some(DELETE_PROMPT));
        assert_eq!(primary.calls() + fallback.calls(), 0);
        assert_eq!(primary.len(), 2);
    }

    #[tokio::test]
    async fn test_confirmed_delete_reloads_stats() {
        let (mut panel, primary, _) = panel();
        let outcome = panel.delete(1, &|_: &str| true).await;

        assert_eq!(outcome, DeleteOutcome::Done(Notice::Success(DELETED.into())));
        assert_eq!(primary.len(), 1);
        assert_eq!(panel.stats().unwrap().total_countries, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_reports_not_found() {
        let (mut panel, _, _) = panel();
        let outcome = panel.delete(99, &|_: &str| true).await;
        assert_eq!(
            outcome,
            DeleteOutcome::Done(Notice::Error("Error: Country not found".into()))
        );
    }

    #[tokio::test]
    async fn test_stats_failure_keeps_previous_figures() {
        let (mut panel, primary, _) = panel();
        panel.load_stats().await.unwrap();
        primary.set_offline(true);

        assert!(panel.load_stats().await.is_err());
        assert_eq!(panel.stats().unwrap().total_countries, 2);
    }
}
