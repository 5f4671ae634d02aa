use mailscout_core::emails::is_valid_email;
use mailscout_core::error::AppError;
use mailscout_core::models::{EmailRecord, StoredEmail, UpsertOutcome};
use mailscout_core::traits::AddressBook;
use sqlx::SqlitePool;

const CREATE_EMAILS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS emails (
        id INTEGER PRIMARY KEY,
        business_name TEXT NOT NULL,
        business_address TEXT NOT NULL DEFAULT '',
        business_website TEXT NOT NULL DEFAULT '',
        email_address TEXT NOT NULL,
        email_sent INTEGER NOT NULL DEFAULT 0,
        UNIQUE (business_name, email_address)
    )
"#;

/// One writer connection to the `emails` table.
pub struct SqliteAddressBook {
    pool: SqlitePool,
}

impl SqliteAddressBook {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored rows, newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<StoredEmail>, AppError> {
        let rows = sqlx::query_as::<_, EmailRow>(
            r#"
            SELECT id, business_name, business_address, business_website, email_address, email_sent
            FROM emails
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM emails")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.0)
    }
}

impl AddressBook for SqliteAddressBook {
    async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(CREATE_EMAILS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create emails table: {e}")))?;
        Ok(())
    }

    async fn upsert(&self, record: &EmailRecord) -> Result<UpsertOutcome, AppError> {
        if !is_valid_email(&record.email_address) {
            return Err(AppError::InvalidRecord(format!(
                "Not an email address: {:?}",
                record.email_address
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO emails
                (business_name, business_address, business_website, email_address, email_sent)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.business_name)
        .bind(&record.business_address)
        .bind(&record.business_website)
        .bind(&record.email_address)
        .bind(record.email_sent)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Ok(UpsertOutcome::Ignored)
        } else {
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn close(self) -> Result<(), AppError> {
        self.pool.close().await;
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct EmailRow {
    id: i64,
    business_name: String,
    business_address: String,
    business_website: String,
    email_address: String,
    email_sent: bool,
}

impl From<EmailRow> for StoredEmail {
    fn from(row: EmailRow) -> Self {
        Self {
            id: row.id,
            business_name: row.business_name,
            business_address: row.business_address,
            business_website: row.business_website,
            email_address: row.email_address,
            email_sent: row.email_sent,
        }
    }
}
