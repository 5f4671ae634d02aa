use crate::error::AppError;
use crate::models::{LocationQuery, RunSummary};

/// Events emitted by the pipeline for monitoring/logging.
///
/// Each event belongs to one stage: `search`, `fetch`, `extract` or `store`.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    QueryStarted {
        query: &'a str,
    },
    LocationSkipped {
        location: &'a LocationQuery,
    },
    SearchFailed {
        query: &'a str,
        error: &'a AppError,
    },
    CandidatesFound {
        query: &'a str,
        with_website: usize,
        without_website: usize,
    },
    Fetching {
        business: &'a str,
        url: &'a str,
    },
    FetchFailed {
        business: &'a str,
        url: &'a str,
        error: &'a AppError,
    },
    EmailsExtracted {
        business: &'a str,
        url: &'a str,
        count: usize,
    },
    EmailStored {
        business: &'a str,
        email: &'a str,
    },
    EmailIgnored {
        business: &'a str,
        email: &'a str,
    },
    StoreFailed {
        business: &'a str,
        email: &'a str,
        error: &'a AppError,
    },
    StoreUnavailable {
        query: &'a str,
        error: &'a AppError,
    },
    SchemaFailed {
        error: &'a AppError,
    },
    CloseFailed {
        error: &'a AppError,
    },
    QueryFinished {
        query: &'a str,
        summary: &'a RunSummary,
    },
    Cancelled,
}

impl PipelineEvent<'_> {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineEvent::QueryStarted { .. }
            | PipelineEvent::LocationSkipped { .. }
            | PipelineEvent::SearchFailed { .. }
            | PipelineEvent::CandidatesFound { .. }
            | PipelineEvent::QueryFinished { .. }
            | PipelineEvent::Cancelled => "search",
            PipelineEvent::Fetching { .. } | PipelineEvent::FetchFailed { .. } => "fetch",
            PipelineEvent::EmailsExtracted { .. } => "extract",
            PipelineEvent::EmailStored { .. }
            | PipelineEvent::EmailIgnored { .. }
            | PipelineEvent::StoreFailed { .. }
            | PipelineEvent::StoreUnavailable { .. }
            | PipelineEvent::SchemaFailed { .. }
            | PipelineEvent::CloseFailed { .. } => "store",
        }
    }
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let stage = event.stage();
        match event {
            PipelineEvent::QueryStarted { query } => {
                tracing::info!(stage, %query, "Searching");
            }
            PipelineEvent::LocationSkipped { location } => {
                tracing::debug!(stage, city = %location.city, state = %location.state, "Incomplete location row skipped");
            }
            PipelineEvent::SearchFailed { query, error } => {
                tracing::error!(stage, %query, %error, "Place search failed, continuing with no candidates");
            }
            PipelineEvent::CandidatesFound {
                query,
                with_website,
                without_website,
            } => {
                tracing::info!(stage, %query, %without_website, "Found {with_website} URLs to process");
            }
            PipelineEvent::Fetching { business, url } => {
                tracing::info!(stage, %business, %url, "Processing website");
            }
            PipelineEvent::FetchFailed {
                business,
                url,
                error,
            } => {
                tracing::warn!(stage, %business, %url, %error, timed_out = error.is_timeout(), "Fetch failed");
            }
            PipelineEvent::EmailsExtracted {
                business,
                url,
                count,
            } => {
                tracing::info!(stage, %business, %url, "Found {count} emails");
            }
            PipelineEvent::EmailStored { business, email } => {
                tracing::debug!(stage, %business, %email, "Email stored");
            }
            PipelineEvent::EmailIgnored { business, email } => {
                tracing::debug!(stage, %business, %email, "Email already stored");
            }
            PipelineEvent::StoreFailed {
                business,
                email,
                error,
            } => {
                tracing::error!(stage, %business, %email, %error, "Error inserting email");
            }
            PipelineEvent::StoreUnavailable { query, error } => {
                tracing::error!(stage, %query, %error, "Could not open the address book, query skipped");
            }
            PipelineEvent::SchemaFailed { error } => {
                tracing::error!(stage, %error, "Error creating table");
            }
            PipelineEvent::CloseFailed { error } => {
                tracing::error!(stage, %error, "Error closing database");
            }
            PipelineEvent::QueryFinished { query, summary } => {
                tracing::info!(
                    stage,
                    %query,
                    candidates = summary.candidates_found,
                    stored = summary.emails_stored,
                    ignored = summary.emails_ignored,
                    fetch_failures = summary.fetch_failures,
                    "Query finished"
                );
            }
            PipelineEvent::Cancelled => {
                tracing::warn!(stage, "Run cancelled");
            }
        }
    }
}
