//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls. Clones share state, so a test keeps
//! one clone for assertions and hands the other to the pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{EmailRecord, PlaceCandidate, UpsertOutcome};
use crate::report::{PipelineEvent, PipelineReporter};
use crate::traits::{AddressBook, AddressBookFactory, PageFetcher, PlaceSearch};
use crate::util::normalize_url;

// ---------------------------------------------------------------------------
// MockPlaceSearch
// ---------------------------------------------------------------------------

/// Mock place search keyed by exact query text.
///
/// Unknown queries return no candidates.
#[derive(Clone, Default)]
pub struct MockPlaceSearch {
    responses: Arc<Mutex<HashMap<String, Result<Vec<PlaceCandidate>, AppError>>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockPlaceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, query: &str, candidates: Vec<PlaceCandidate>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(candidates));
        self
    }

    pub fn with_error(self, query: &str, error: AppError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), Err(error));
        self
    }

    /// Every query searched so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl PlaceSearch for MockPlaceSearch {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, AppError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher keyed by normalized URL.
///
/// Unknown URLs fail like a 404 would.
#[derive(Clone, Default)]
pub struct MockPageFetcher {
    pages: Arc<Mutex<HashMap<String, Result<String, AppError>>>>,
    fetched: Arc<Mutex<Vec<String>>>,
    budgets: Arc<Mutex<Vec<Duration>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, content: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(normalize_url(url), Ok(content.to_string()));
        self
    }

    pub fn with_error(self, url: &str, error: AppError) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(normalize_url(url), Err(error));
        self
    }

    /// Every URL fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// The budget passed with each fetch, in call order.
    pub fn budgets(&self) -> Vec<Duration> {
        self.budgets.lock().unwrap().clone()
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str, budget: Duration) -> Result<String, AppError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.budgets.lock().unwrap().push(budget);
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(AppError::HttpError(format!("HTTP 404 for {url}"))))
    }
}

// ---------------------------------------------------------------------------
// MockAddressBookFactory / MockAddressBook
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BookState {
    rows: Vec<EmailRecord>,
    opened: usize,
    closed: usize,
    open_error: Option<AppError>,
    schema_error: Option<AppError>,
    failing_emails: HashSet<String>,
}

/// In-memory address book enforcing the `(business_name, email_address)`
/// uniqueness of the real table.
#[derive(Clone, Default)]
pub struct MockAddressBookFactory {
    state: Arc<Mutex<BookState>>,
}

impl MockAddressBookFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `open` fails with `error`; later opens succeed.
    pub fn with_open_error(self, error: AppError) -> Self {
        self.state.lock().unwrap().open_error = Some(error);
        self
    }

    /// The next `ensure_schema` fails with `error`.
    pub fn with_schema_error(self, error: AppError) -> Self {
        self.state.lock().unwrap().schema_error = Some(error);
        self
    }

    /// Every upsert of this (normalized) address fails.
    pub fn with_failing_email(self, email: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_emails
            .insert(email.to_string());
        self
    }

    /// Stored rows in insertion order.
    pub fn rows(&self) -> Vec<EmailRecord> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

impl AddressBookFactory for MockAddressBookFactory {
    type Book = MockAddressBook;

    async fn open(&self) -> Result<MockAddressBook, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.open_error.take() {
            return Err(e);
        }
        state.opened += 1;
        Ok(MockAddressBook {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockAddressBook {
    state: Arc<Mutex<BookState>>,
}

impl AddressBook for MockAddressBook {
    async fn ensure_schema(&self) -> Result<(), AppError> {
        match self.state.lock().unwrap().schema_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn upsert(&self, record: &EmailRecord) -> Result<UpsertOutcome, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_emails.contains(&record.email_address) {
            return Err(AppError::DatabaseError(format!(
                "failed to insert {}",
                record.email_address
            )));
        }
        let exists = state.rows.iter().any(|row| {
            row.business_name == record.business_name && row.email_address == record.email_address
        });
        if exists {
            return Ok(UpsertOutcome::Ignored);
        }
        state.rows.push(record.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn close(self) -> Result<(), AppError> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock pipeline reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineReporter for MockReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let label = match &event {
            PipelineEvent::QueryStarted { .. } => "QueryStarted",
            PipelineEvent::LocationSkipped { .. } => "LocationSkipped",
            PipelineEvent::SearchFailed { .. } => "SearchFailed",
            PipelineEvent::CandidatesFound { .. } => "CandidatesFound",
            PipelineEvent::Fetching { .. } => "Fetching",
            PipelineEvent::FetchFailed { .. } => "FetchFailed",
            PipelineEvent::EmailsExtracted { .. } => "EmailsExtracted",
            PipelineEvent::EmailStored { .. } => "EmailStored",
            PipelineEvent::EmailIgnored { .. } => "EmailIgnored",
            PipelineEvent::StoreFailed { .. } => "StoreFailed",
            PipelineEvent::StoreUnavailable { .. } => "StoreUnavailable",
            PipelineEvent::SchemaFailed { .. } => "SchemaFailed",
            PipelineEvent::CloseFailed { .. } => "CloseFailed",
            PipelineEvent::QueryFinished { .. } => "QueryFinished",
            PipelineEvent::Cancelled => "Cancelled",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}
