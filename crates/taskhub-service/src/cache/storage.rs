//! Caching wrappers implementing the storage traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taskhub_storage::{Account, AccountStorage, StorageError, Task, TaskStorage};
use uuid::Uuid;

use super::{CacheBackend, account_key, task_key, task_list_key};

/// Read-through, write-invalidate cache in front of a [`TaskStorage`].
///
/// `get_by_id` and `list_by_owner` are served from the cache when possible
/// and populate it on a miss. `create`, `update` and `delete` write to the
/// inner storage first and then remove every key that may now be stale.
#[derive(Clone)]
pub struct CachedTaskStorage {
    inner: Arc<dyn TaskStorage>,
    cache: CacheBackend,
    ttl: Duration,
}

impl CachedTaskStorage {
    pub fn new(inner: Arc<dyn TaskStorage>, cache: CacheBackend, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn invalidate(&self, task_id: Uuid, owner: Uuid) {
        self.cache.invalidate(&task_key(task_id)).await;
        self.cache.invalidate(&task_list_key(owner)).await;
    }
}

#[async_trait]
impl TaskStorage for CachedTaskStorage {
    async fn create(&self, task: &Task) -> Result<Task, StorageError> {
        let created = self.inner.create(task).await?;
        self.cache.invalidate(&task_list_key(created.user_id)).await;
        self.cache
            .set_json(&task_key(created.id), &created, self.ttl)
            .await;
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task, StorageError> {
        let key = task_key(id);
        if let Some(task) = self.cache.get_json::<Task>(&key).await {
            return Ok(task);
        }

        let task = self.inner.get_by_id(id).await?;
        self.cache.set_json(&key, &task, self.ttl).await;
        Ok(task)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
        let key = task_list_key(owner);
        if let Some(tasks) = self.cache.get_json::<Vec<Task>>(&key).await {
            return Ok(tasks);
        }

        let tasks = self.inner.list_by_owner(owner).await?;
        self.cache.set_json(&key, &tasks, self.ttl).await;
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<Task, StorageError> {
        let updated = self.inner.update(task).await?;
        self.invalidate(updated.id, updated.user_id).await;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        // The owner is needed for the list key. It never changes, so a cached
        // copy is as good as a stored one.
        let owner = self.get_by_id(id).await?.user_id;
        let result = self.inner.delete(id).await;
        self.invalidate(id, owner).await;
        result
    }
}

/// Read-through cache in front of an [`AccountStorage`].
///
/// Only lookups by id are cached. Email lookups always reach storage because
/// they back login and uniqueness checks.
#[derive(Clone)]
pub struct CachedAccountStorage {
    inner: Arc<dyn AccountStorage>,
    cache: CacheBackend,
    ttl: Duration,
}

impl CachedAccountStorage {
    pub fn new(inner: Arc<dyn AccountStorage>, cache: CacheBackend, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl AccountStorage for CachedAccountStorage {
    async fn create(&self, account: &Account) -> Result<Account, StorageError> {
        let created = self.inner.create(account).await?;
        self.cache
            .set_json(&account_key(created.id), &created, self.ttl)
            .await;
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StorageError> {
        let key = account_key(id);
        if let Some(account) = self.cache.get_json::<Account>(&key).await {
            return Ok(account);
        }

        let account = self.inner.get_by_id(id).await?;
        self.cache.set_json(&key, &account, self.ttl).await;
        Ok(account)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, StorageError> {
        self.inner.get_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<Account>, StorageError> {
        self.inner.list().await
    }

    async fn update(&self, account: &Account) -> Result<Account, StorageError> {
        let updated = self.inner.update(account).await?;
        self.cache.invalidate(&account_key(updated.id)).await;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let result = self.inner.delete(id).await;
        self.cache.invalidate(&account_key(id)).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use taskhub_db_memory::InMemoryStorage;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    /// Counts reads that reach the wrapped storage.
    struct CountingTasks {
        inner: InMemoryStorage,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl TaskStorage for CountingTasks {
        async fn create(&self, task: &Task) -> Result<Task, StorageError> {
            TaskStorage::create(&self.inner, task).await
        }
        async fn get_by_id(&self, id: Uuid) -> Result<Task, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            TaskStorage::get_by_id(&self.inner, id).await
        }
        async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.list_by_owner(owner).await
        }
        async fn update(&self, task: &Task) -> Result<Task, StorageError> {
            TaskStorage::update(&self.inner, task).await
        }
        async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
            TaskStorage::delete(&self.inner, id).await
        }
    }

    fn counting() -> Arc<CountingTasks> {
        Arc::new(CountingTasks {
            inner: InMemoryStorage::new(),
            reads: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_get_is_served_from_cache_after_first_read() {
        let inner = counting();
        let cache = CacheBackend::new_local();
        let tasks = CachedTaskStorage::new(inner.clone(), cache.clone(), TTL);

        let task = TaskStorage::create(&inner.inner, &Task::new(Uuid::new_v4(), "t", ""))
            .await
            .unwrap();

        tasks.get_by_id(task.id).await.unwrap();
        tasks.get_by_id(task.id).await.unwrap();
        assert_eq!(inner.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_warms_entry_and_drops_list() {
        let inner = counting();
        let cache = CacheBackend::new_local();
        let tasks = CachedTaskStorage::new(inner.clone(), cache.clone(), TTL);
        let owner = Uuid::new_v4();

        assert!(tasks.list_by_owner(owner).await.unwrap().is_empty());
        let created = tasks.create(&Task::new(owner, "t", "")).await.unwrap();

        assert!(cache.get(&task_key(created.id)).await.is_some());
        assert_eq!(tasks.list_by_owner(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_invalidates_entry_and_list() {
        let inner = counting();
        let cache = CacheBackend::new_local();
        let tasks = CachedTaskStorage::new(inner.clone(), cache.clone(), TTL);
        let owner = Uuid::new_v4();

        let task = tasks.create(&Task::new(owner, "t", "")).await.unwrap();
        tasks.list_by_owner(owner).await.unwrap();

        let mut changed = task.clone();
        changed.completed = true;
        tasks.update(&changed).await.unwrap();

        assert!(cache.get(&task_key(task.id)).await.is_none());
        assert!(cache.get(&task_list_key(owner)).await.is_none());
        assert!(tasks.get_by_id(task.id).await.unwrap().completed);
        assert!(tasks.list_by_owner(owner).await.unwrap()[0].completed);
    }

    #[tokio::test]
    async fn test_delete_invalidates_entry_and_list() {
        let inner = counting();
        let cache = CacheBackend::new_local();
        let tasks = CachedTaskStorage::new(inner.clone(), cache.clone(), TTL);
        let owner = Uuid::new_v4();

        let task = tasks.create(&Task::new(owner, "t", "")).await.unwrap();
        tasks.list_by_owner(owner).await.unwrap();

        tasks.delete(task.id).await.unwrap();

        assert!(tasks.get_by_id(task.id).await.unwrap_err().is_task_not_found());
        assert!(tasks.list_by_owner(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_task_is_not_found() {
        let tasks = CachedTaskStorage::new(counting(), CacheBackend::new_local(), TTL);
        let err = tasks.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_task_not_found());
    }

    #[tokio::test]
    async fn test_malformed_entry_falls_through() {
        let inner = counting();
        let cache = CacheBackend::new_local();
        let tasks = CachedTaskStorage::new(inner.clone(), cache.clone(), TTL);

        let task = TaskStorage::create(&inner.inner, &Task::new(Uuid::new_v4(), "t", ""))
            .await
            .unwrap();
        cache.set(&task_key(task.id), b"garbage".to_vec(), TTL).await;

        assert_eq!(tasks.get_by_id(task.id).await.unwrap(), task);
        assert_eq!(inner.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_reads_storage() {
        let inner = counting();
        let tasks = CachedTaskStorage::new(inner.clone(), CacheBackend::Disabled, TTL);
        let task = tasks.create(&Task::new(Uuid::new_v4(), "t", "")).await.unwrap();

        tasks.get_by_id(task.id).await.unwrap();
        tasks.get_by_id(task.id).await.unwrap();
        assert_eq!(inner.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_warmed_entries_do_not_outlive_ttl() {
        let store = Arc::new(InMemoryStorage::new());
        let cache = CacheBackend::new_local();
        let short = Duration::from_millis(10);
        let accounts = CachedAccountStorage::new(store.clone(), cache.clone(), short);
        let tasks = CachedTaskStorage::new(store.clone(), cache.clone(), short);

        for i in 0..500 {
            let account = accounts
                .create(&Account::new(format!("user{i}@example.com"), "hash"))
                .await
                .unwrap();
            tasks.create(&Task::new(account.id, "t", "")).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        for i in 0..500 {
            accounts
                .create(&Account::new(format!("late{i}@example.com"), "hash"))
                .await
                .unwrap();
        }
        assert!(
            cache.local_len() <= 600,
            "expired entries retained: {}",
            cache.local_len()
        );
    }

    #[tokio::test]
    async fn test_account_cache_read_through_and_invalidate() {
        let inner = Arc::new(InMemoryStorage::new());
        let cache = CacheBackend::new_local();
        let accounts = CachedAccountStorage::new(inner.clone(), cache.clone(), TTL);

        let mut account = accounts
            .create(&Account::new("alice@example.com", "hash"))
            .await
            .unwrap();
        assert!(cache.get(&account_key(account.id)).await.is_some());

        account.email = "alice@new.example.com".into();
        accounts.update(&account).await.unwrap();
        assert!(cache.get(&account_key(account.id)).await.is_none());
        assert_eq!(
            accounts.get_by_id(account.id).await.unwrap().email,
            "alice@new.example.com"
        );

        accounts.delete(account.id).await.unwrap();
        assert!(
            accounts
                .get_by_id(account.id)
                .await
                .unwrap_err()
                .is_account_not_found()
        );
    }
}
