pub mod address_book;
pub mod config;
pub mod database;

pub use address_book::SqliteAddressBook;
pub use config::DatabaseConfig;
pub use database::Database;
