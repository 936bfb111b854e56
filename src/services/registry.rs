use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::decision::Decision;
use crate::services::token_bucket::{BucketSnapshot, TokenBucket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("account already registered")]
    AccountExists,

    #[error("account not registered")]
    UnknownAccount,
}

/// In-memory registry mapping account ids to their token buckets.
///
/// Admission resolves the bucket under a shared read lock, so callers hitting
/// different accounts never serialize on each other; only the bucket's own
/// mutex orders callers racing for the same account. The write lock is taken
/// for registration and removal only.
#[derive(Clone, Default)]
pub struct AccountRegistry {
    inner: Arc<RwLock<HashMap<String, TokenBucket>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bucket for a new account id. Ids are never silently
    /// overwritten; replacing a live bucket takes an explicit `remove` first.
    pub async fn register(
        &self,
        account_id: String,
        bucket: TokenBucket,
    ) -> Result<(), RegistryError> {
        let mut accounts = self.inner.write().await;
        if accounts.contains_key(&account_id) {
            return Err(RegistryError::AccountExists);
        }
        accounts.insert(account_id, bucket);
        Ok(())
    }

    pub async fn remove(&self, account_id: &str) -> Result<(), RegistryError> {
        self.inner
            .write()
            .await
            .remove(account_id)
            .map(|_| ())
            .ok_or(RegistryError::UnknownAccount)
    }

    /// Runs one admission attempt against the account's bucket.
    pub async fn try_consume(&self, account_id: &str) -> Result<Decision, RegistryError> {
        let accounts = self.inner.read().await;
        let bucket = accounts
            .get(account_id)
            .ok_or(RegistryError::UnknownAccount)?;
        Ok(bucket.try_consume())
    }

    pub async fn peek(&self, account_id: &str) -> Result<BucketSnapshot, RegistryError> {
        let accounts = self.inner.read().await;
        let bucket = accounts
            .get(account_id)
            .ok_or(RegistryError::UnknownAccount)?;
        Ok(bucket.peek())
    }

    pub async fn accounts(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }

    pub async fn account_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
