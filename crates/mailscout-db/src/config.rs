use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "mydb.sqlite";

/// Location of the SQLite address book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read configuration from environment variables.
    ///
    /// - `MAILSCOUT_DB_PATH` (optional, defaults to `mydb.sqlite` in the
    ///   working directory)
    pub fn from_env() -> Self {
        match std::env::var("MAILSCOUT_DB_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::new(path.trim()),
            _ => Self::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}
