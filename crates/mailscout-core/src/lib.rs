pub mod config;
pub mod emails;
pub mod error;
pub mod locations;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod traits;
pub mod util;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::{FetchStrategy, PipelineConfig};
pub use emails::{extract_emails, is_valid_email, normalize_email};
pub use error::AppError;
pub use models::{EmailRecord, LocationQuery, PlaceCandidate, RunSummary, StoredEmail, UpsertOutcome};
pub use pipeline::EmailPipeline;
pub use report::{PipelineEvent, PipelineReporter, TracingPipelineReporter};
pub use traits::{AddressBook, AddressBookFactory, PageFetcher, PlaceSearch};
