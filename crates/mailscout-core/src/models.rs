use serde::{Deserialize, Serialize};

use crate::emails::normalize_email;

/// A business returned by the place search, not yet known to have an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub name: String,
    /// Empty when the API did not return a formatted address.
    pub address: String,
    /// Empty when the business has no website; such candidates are never fetched.
    pub website_url: String,
}

impl PlaceCandidate {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            website_url: website_url.into(),
        }
    }

    pub fn has_website(&self) -> bool {
        !self.website_url.trim().is_empty()
    }
}

/// DTO for inserting one `(business, email)` pair into the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRecord {
    pub business_name: String,
    pub business_address: String,
    pub business_website: String,
    /// Lower-cased and whitespace-free.
    pub email_address: String,
    pub email_sent: bool,
}

impl EmailRecord {
    /// Builds the record for an email found on a candidate's site, applying
    /// the storage-boundary normalization.
    pub fn for_candidate(candidate: &PlaceCandidate, raw_email: &str) -> Self {
        Self {
            business_name: candidate.name.clone(),
            business_address: candidate.address.clone(),
            business_website: candidate.website_url.clone(),
            email_address: normalize_email(raw_email),
            email_sent: false,
        }
    }
}

/// A row read back from the `emails` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEmail {
    pub id: i64,
    pub business_name: String,
    pub business_address: String,
    pub business_website: String,
    pub email_address: String,
    pub email_sent: bool,
}

/// One row of the optional location list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub city: String,
    pub state: String,
}

impl LocationQuery {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }

    /// A row is usable only when both fields carry text.
    pub fn is_complete(&self) -> bool {
        !self.city.trim().is_empty() && !self.state.trim().is_empty()
    }

    /// Scopes a base query to this location: `"<base> in <city>, <state>"`.
    pub fn scope(&self, base: &str) -> String {
        format!("{} in {}, {}", base, self.city.trim(), self.state.trim())
    }
}

/// Result of an insert-or-ignore write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    /// The `(business_name, email_address)` pair was already stored.
    Ignored,
}

/// Aggregate statistics of a pipeline run.
///
/// A batch summary is the field-wise sum of its sub-pipeline summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub queries_run: usize,
    /// Sub-pipelines skipped because the store could not be opened.
    pub queries_skipped: usize,
    pub search_failures: usize,
    pub candidates_found: usize,
    pub candidates_without_website: usize,
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub emails_extracted: usize,
    pub emails_stored: usize,
    pub emails_ignored: usize,
    pub store_failures: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.queries_run += other.queries_run;
        self.queries_skipped += other.queries_skipped;
        self.search_failures += other.search_failures;
        self.candidates_found += other.candidates_found;
        self.candidates_without_website += other.candidates_without_website;
        self.pages_fetched += other.pages_fetched;
        self.fetch_failures += other.fetch_failures;
        self.emails_extracted += other.emails_extracted;
        self.emails_stored += other.emails_stored;
        self.emails_ignored += other.emails_ignored;
        self.store_failures += other.store_failures;
        self.cancelled |= other.cancelled;
    }
}
