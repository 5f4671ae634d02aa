use std::path::Path;

use mailscout_core::error::AppError;
use mailscout_core::traits::AddressBookFactory;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::address_book::SqliteAddressBook;
use crate::config::DatabaseConfig;

/// Opens address-book connections against one SQLite file.
///
/// Each [`AddressBookFactory::open`] hands out a fresh single-connection
/// pool, so every sub-pipeline owns exactly one writer and closes it when it
/// is done.
#[derive(Debug, Clone)]
pub struct Database {
    options: SqliteConnectOptions,
    config: DatabaseConfig,
}

impl Database {
    /// The file is created on first open if it does not exist.
    pub fn new(config: DatabaseConfig) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);
        Self { options, config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Open a connection without going through the factory trait.
    pub async fn connect(&self) -> Result<SqliteAddressBook, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to open {}: {e}",
                    self.config.path.display()
                ))
            })?;

        tracing::debug!(path = %self.config.path.display(), "Opened address book");
        Ok(SqliteAddressBook::new(pool))
    }
}

impl AddressBookFactory for Database {
    type Book = SqliteAddressBook;

    async fn open(&self) -> Result<SqliteAddressBook, AppError> {
        self.connect().await
    }
}
