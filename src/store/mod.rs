//! Narrow interface over the document store.
//!
//! Handlers only see [`DocumentStore`]; the Postgres implementation is the
//! deployment backend and [`MemoryStore`] backs tests. Email uniqueness is
//! the store's job: `insert_account` must fail with [`StoreError::Duplicate`]
//! on a second account with the same email, so signup never needs a
//! check-then-insert round trip.

mod memory;
mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::{Account, ContactSubmission, UserView, WaitlistEntry};
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique-constraint violation on insert.
    #[error("duplicate record")]
    Duplicate,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    /// The bounded call timeout elapsed.
    #[error("store call timed out")]
    Timeout,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is already taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError>;

    async fn insert_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError>;
}
