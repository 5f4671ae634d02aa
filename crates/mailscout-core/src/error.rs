use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for mailscout.
///
/// Every variant carries owned, cloneable data so errors can be recorded by
/// reporters and replayed by test doubles.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// HTTP request failed (fetching a page or calling the places API).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error (DNS, refused connection, reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The operation exceeded its time budget and was cancelled.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The places API answered with a non-success status.
    #[error("Places API error (HTTP {status_code}): {message}")]
    PlacesApi { status_code: u16, message: String },

    /// The places API answered with a body we could not decode.
    #[error("Unexpected places response: {0}")]
    ApiShape(String),

    /// Browser navigation failed or the rendered document could not be read.
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// The headless browser could not be configured or launched.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A record was rejected before reaching the database.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The location file could not be read or lacks the required columns.
    #[error("Invalid location input: {0}")]
    InputFormat(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if the failure was a budget expiry rather than a hard error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }
}
