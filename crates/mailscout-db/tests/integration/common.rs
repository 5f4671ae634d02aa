use mailscout_core::models::EmailRecord;
use mailscout_db::{Database, DatabaseConfig};
use tempfile::TempDir;

/// Creates a database handle on a file inside a fresh temporary directory.
///
/// The `TempDir` must be kept in scope for the test duration; dropping it
/// deletes the database file.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::new(DatabaseConfig::new(dir.path().join("mydb.sqlite")));
    (db, dir)
}

pub fn record(business: &str, email: &str) -> EmailRecord {
    EmailRecord {
        business_name: business.into(),
        business_address: format!("1 Main St, {business}"),
        business_website: format!("{business}.com"),
        email_address: email.into(),
        email_sent: false,
    }
}
