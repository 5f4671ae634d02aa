use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::{EmailRecord, PlaceCandidate, UpsertOutcome};

/// Turns a free-text query into business candidates.
pub trait PlaceSearch: Send + Sync + Clone {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PlaceCandidate>, AppError>> + Send;
}

/// Retrieves raw page content for a URL within a time budget.
///
/// Implementations must release their connection or browser on every path,
/// including budget expiry.
pub trait PageFetcher: Send + Sync + Clone {
    fn fetch(
        &self,
        url: &str,
        budget: Duration,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// One open writer connection to the address book.
pub trait AddressBook: Send + Sync {
    /// Creates the `emails` table if it does not exist yet.
    fn ensure_schema(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Inserts the record, or does nothing if the business/email pair is
    /// already stored.
    fn upsert(
        &self,
        record: &EmailRecord,
    ) -> impl Future<Output = Result<UpsertOutcome, AppError>> + Send;

    /// Releases the connection.
    fn close(self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Opens address-book connections, one per sub-pipeline.
pub trait AddressBookFactory: Send + Sync + Clone {
    type Book: AddressBook;

    fn open(&self) -> impl Future<Output = Result<Self::Book, AppError>> + Send;
}
