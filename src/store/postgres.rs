use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::models::{Account, ContactSubmission, WaitlistEntry};
use super::{DocumentStore, StoreError};

/// Postgres implementation of [`DocumentStore`]. Every call runs under a
/// fixed timeout so a stuck store surfaces as an error instead of a hang.
pub struct PgStore {
    pool: Arc<PgPool>,
    call_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>, call_timeout: Duration) -> Self {
        Self { pool, call_timeout }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        call_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(call_timeout)
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self::new(Arc::new(pool), call_timeout))
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Duplicate
        }
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.bounded(
            sqlx::query_as::<_, Account>(
                "SELECT id, email, password_hash, name, created_at, updated_at \
                 FROM accounts WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(self.pool.as_ref()),
        )
        .await
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                "INSERT INTO accounts (id, email, password_hash, name, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(account.id)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.name)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(self.pool.as_ref()),
        )
        .await?;
        Ok(())
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                "INSERT INTO contact_submissions \
                 (id, name, email, subject, message, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(submission.id)
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.subject)
            .bind(&submission.message)
            .bind(&submission.status)
            .bind(submission.created_at)
            .execute(self.pool.as_ref()),
        )
        .await?;
        Ok(())
    }

    async fn insert_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                "INSERT INTO waitlist_entries \
                 (id, email, first_name, last_name, source, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(entry.id)
            .bind(&entry.email)
            .bind(&entry.first_name)
            .bind(&entry.last_name)
            .bind(&entry.source)
            .bind(&entry.status)
            .bind(entry.created_at)
            .execute(self.pool.as_ref()),
        )
        .await?;
        Ok(())
    }
}
