//! Storage traits implemented by every backend.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageError;
use crate::types::{Account, Task};

/// Account persistence.
///
/// Implementations must be thread-safe (`Send + Sync`) and keep the
/// email to id mapping one-to-one.
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Persists a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::EmailTaken` if another account has the same email.
    async fn create(&self, account: &Account) -> Result<Account, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AccountNotFound` if no account has this id.
    async fn get_by_id(&self, id: Uuid) -> Result<Account, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AccountNotFound` if no account has this email.
    async fn get_by_email(&self, email: &str) -> Result<Account, StorageError>;

    /// Lists every account.
    async fn list(&self) -> Result<Vec<Account>, StorageError>;

    /// Replaces the stored account with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AccountNotFound` if the account does not exist and
    /// `StorageError::EmailTaken` if the new email belongs to another account.
    async fn update(&self, account: &Account) -> Result<Account, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::AccountNotFound` if no account has this id.
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}

/// Task persistence.
///
/// No owner existence check happens at this layer.
#[async_trait]
pub trait TaskStorage: Send + Sync {
    /// Persists a new task.
    async fn create(&self, task: &Task) -> Result<Task, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::TaskNotFound` if no task has this id.
    async fn get_by_id(&self, id: Uuid) -> Result<Task, StorageError>;

    /// Lists all tasks owned by `owner`, oldest first. Empty when none.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StorageError>;

    /// Replaces title, description, completion and `updated_at` of the task
    /// with the same id. The owner is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TaskNotFound` if the task does not exist.
    async fn update(&self, task: &Task) -> Result<Task, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::TaskNotFound` if no task has this id.
    async fn delete(&self, id: Uuid) -> Result<(), StorageError>;
}
