use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{Account, ContactSubmission, WaitlistEntry};
use super::{DocumentStore, StoreError};

/// In-process [`DocumentStore`] keyed by email, with the same uniqueness
/// semantics as the Postgres backend. Used by tests and useful as a template
/// for substituting another backend without touching handler code.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
    contacts: RwLock<Vec<ContactSubmission>>,
    waitlist: RwLock<Vec<WaitlistEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contacts(&self) -> Vec<ContactSubmission> {
        self.contacts.read().await.clone()
    }

    pub async fn waitlist(&self) -> Vec<WaitlistEntry> {
        self.waitlist.read().await.clone()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(StoreError::Duplicate);
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<(), StoreError> {
        self.contacts.write().await.push(submission.clone());
        Ok(())
    }

    async fn insert_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError> {
        self.waitlist.write().await.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let first = Account::new("a@x.com".into(), "hash1".into(), "A".into());
        let second = Account::new("a@x.com".into(), "hash2".into(), "B".into());

        store.insert_account(&first).await.unwrap();
        let err = store.insert_account(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.account_count().await, 1);

        let found = store.find_account_by_email("a@x.com").await.unwrap();
        assert_eq!(found.unwrap().name, "A");
    }

    #[tokio::test]
    async fn submissions_are_append_only() {
        let store = MemoryStore::new();
        let submission =
            ContactSubmission::new("A".into(), "a@x.com".into(), "Hi".into(), "Hello".into());
        store.insert_contact(&submission).await.unwrap();
        store.insert_contact(&submission).await.unwrap();
        assert_eq!(store.contacts().await.len(), 2);
    }
}
