//! Account registration and lookup.

use std::sync::Arc;

use taskhub_storage::{Account, AccountStorage, StorageError};
use uuid::Uuid;

use crate::error::ServiceError;

/// Registration and lookup over an [`AccountStorage`].
///
/// No authorization happens here. Callers decide who may see which account.
#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStorage>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStorage>) -> Self {
        Self { accounts }
    }

    /// Registers a new account with an already hashed password.
    ///
    /// Fails with a conflict if the email is in use. The storage backend's own
    /// uniqueness check still decides races between concurrent registrations.
    #[tracing::instrument(skip(self, password_hash))]
    pub async fn register(&self, email: &str, password_hash: &str) -> Result<Account, ServiceError> {
        match self.accounts.get_by_email(email).await {
            Ok(_) => return Err(StorageError::email_taken(email).into()),
            Err(e) if e.is_account_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let account = self
            .accounts
            .create(&Account::new(email, password_hash))
            .await?;
        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Account, ServiceError> {
        Ok(self.accounts.get_by_id(id).await?)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Account, ServiceError> {
        Ok(self.accounts.get_by_email(email).await?)
    }

    pub async fn list(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.accounts.list().await?)
    }

    pub async fn update(&self, account: &Account) -> Result<Account, ServiceError> {
        Ok(self.accounts.update(account).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.accounts.delete(id).await?)
    }
}
