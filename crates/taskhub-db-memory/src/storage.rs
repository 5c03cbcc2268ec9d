use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use taskhub_storage::{Account, AccountStorage, StorageError, Task, TaskStorage};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<Uuid, Account>,
    /// email -> id. Updated under the same lock as `by_id`.
    by_email: HashMap<String, Uuid>,
}

/// In-memory storage for accounts and tasks.
///
/// Cloning is cheap and every clone shares the same data. Each entity map is
/// guarded by its own `RwLock`, so a create, update or delete is atomic with
/// respect to every other call in this process. Email uniqueness is checked
/// and recorded under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    accounts: Arc<RwLock<Accounts>>,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
}

impl InMemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStorage for InMemoryStorage {
    async fn create(&self, account: &Account) -> Result<Account, StorageError> {
        let mut guard = self.accounts.write().await;
        if guard.by_email.contains_key(&account.email) {
            return Err(StorageError::email_taken(&account.email));
        }
        guard.by_email.insert(account.email.clone(), account.id);
        guard.by_id.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StorageError> {
        self.accounts
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::account_not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, StorageError> {
        let guard = self.accounts.read().await;
        guard
            .by_email
            .get(email)
            .and_then(|id| guard.by_id.get(id))
            .cloned()
            .ok_or_else(|| StorageError::account_email_not_found(email))
    }

    async fn list(&self) -> Result<Vec<Account>, StorageError> {
        let guard = self.accounts.read().await;
        let mut accounts: Vec<Account> = guard.by_id.values().cloned().collect();
        accounts.sort_by_key(|a| (a.created_at, a.id));
        Ok(accounts)
    }

    async fn update(&self, account: &Account) -> Result<Account, StorageError> {
        let mut guard = self.accounts.write().await;
        let Some(old_email) = guard.by_id.get(&account.id).map(|a| a.email.clone()) else {
            return Err(StorageError::account_not_found(account.id));
        };

        if old_email != account.email {
            if guard.by_email.contains_key(&account.email) {
                return Err(StorageError::email_taken(&account.email));
            }
            guard.by_email.remove(&old_email);
            guard.by_email.insert(account.email.clone(), account.id);
        }
        guard.by_id.insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let mut guard = self.accounts.write().await;
        let account = guard
            .by_id
            .remove(&id)
            .ok_or_else(|| StorageError::account_not_found(id))?;
        guard.by_email.remove(&account.email);
        Ok(())
    }
}

#[async_trait]
impl TaskStorage for InMemoryStorage {
    async fn create(&self, task: &Task) -> Result<Task, StorageError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task, StorageError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::task_not_found(id))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.created_at, t.id));
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<Task, StorageError> {
        let mut guard = self.tasks.write().await;
        let stored = guard
            .get_mut(&task.id)
            .ok_or_else(|| StorageError::task_not_found(task.id))?;

        stored.title.clone_from(&task.title);
        stored.description.clone_from(&task.description);
        stored.completed = task.completed;
        stored.updated_at = task.updated_at;
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        self.tasks
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::task_not_found(id))
    }
}
