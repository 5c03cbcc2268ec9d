//! Task operations guarded by ownership checks.
//!
//! Every operation on an existing task resolves it first and only then
//! compares its owner with the requestor. A missing task is reported as not
//! found to everyone, while an existing task owned by someone else is
//! forbidden. The order reveals existence but never contents.

use std::sync::Arc;

use taskhub_storage::{AccountStorage, Task, TaskPatch, TaskStorage};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::validation::validate_title;

/// Task service.
///
/// `accounts` must be the raw store: owner existence is a precondition and is
/// never answered from cache. `tasks` is usually a
/// [`CachedTaskStorage`](crate::cache::CachedTaskStorage), which keeps the
/// cache coherent with every write made here.
#[derive(Clone)]
pub struct TaskService {
    accounts: Arc<dyn AccountStorage>,
    tasks: Arc<dyn TaskStorage>,
}

impl TaskService {
    pub fn new(accounts: Arc<dyn AccountStorage>, tasks: Arc<dyn TaskStorage>) -> Self {
        Self { accounts, tasks }
    }

    /// Creates a task for an existing account.
    #[tracing::instrument(skip(self, title, description))]
    pub async fn create(
        &self,
        owner: Uuid,
        title: &str,
        description: &str,
    ) -> Result<Task, ServiceError> {
        validate_title(title)?;
        self.accounts.get_by_id(owner).await?;

        let task = self
            .tasks
            .create(&Task::new(owner, title, description))
            .await?;
        tracing::debug!(task_id = %task.id, "task created");
        Ok(task)
    }

    pub async fn get_by_id(&self, task_id: Uuid, requestor: Uuid) -> Result<Task, ServiceError> {
        self.resolve_owned(task_id, requestor).await
    }

    /// Lists the owner's tasks, oldest first.
    pub async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, ServiceError> {
        self.accounts.get_by_id(owner).await?;
        Ok(self.tasks.list_by_owner(owner).await?)
    }

    /// Applies the fields present in `patch` and refreshes `updated_at`.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(
        &self,
        task_id: Uuid,
        requestor: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        let mut task = self.resolve_owned(task_id, requestor).await?;
        if let Some(title) = patch.title.as_deref() {
            validate_title(title)?;
        }

        task.apply(patch);
        Ok(self.tasks.update(&task).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, task_id: Uuid, requestor: Uuid) -> Result<(), ServiceError> {
        self.resolve_owned(task_id, requestor).await?;
        self.tasks.delete(task_id).await?;
        tracing::debug!(task_id = %task_id, "task deleted");
        Ok(())
    }

    async fn resolve_owned(&self, task_id: Uuid, requestor: Uuid) -> Result<Task, ServiceError> {
        let task = self.tasks.get_by_id(task_id).await?;
        if !task.is_owned_by(requestor) {
            tracing::debug!(task_id = %task_id, requestor = %requestor, "ownership check failed");
            return Err(ServiceError::forbidden("you do not own this todo"));
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use taskhub_db_memory::InMemoryStorage;
    use taskhub_storage::{Account, StorageError};

    use super::*;
    use crate::cache::{CacheBackend, CachedTaskStorage};
    use crate::error::ErrorKind;

    struct Fixture {
        store: Arc<InMemoryStorage>,
        service: TaskService,
        alice: Uuid,
        bob: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStorage::new());
        let cached = Arc::new(CachedTaskStorage::new(
            store.clone(),
            CacheBackend::new_local(),
            Duration::from_secs(60),
        ));
        let service = TaskService::new(store.clone(), cached);

        let alice = AccountStorage::create(store.as_ref(), &Account::new("alice@example.com", "h"))
            .await
            .unwrap()
            .id;
        let bob = AccountStorage::create(store.as_ref(), &Account::new("bob@example.com", "h"))
            .await
            .unwrap()
            .id;

        Fixture {
            store,
            service,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_owner_can_read_and_mutate() {
        let f = fixture().await;
        let task = f.service.create(f.alice, "Buy milk", "2L").await.unwrap();
        assert!(!task.completed);
        assert_eq!(task.user_id, f.alice);

        let fetched = f.service.get_by_id(task.id, f.alice).await.unwrap();
        assert_eq!(fetched, task);

        let patch = TaskPatch {
            completed: Some(true),
            ..Default::default()
        };
        let updated = f.service.update(task.id, f.alice, patch).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, "2L");
        assert!(updated.updated_at >= task.updated_at);

        f.service.delete(task.id, f.alice).await.unwrap();
        assert!(f.service.list_by_owner(f.alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let f = fixture().await;
        let err = f.service.create(f.alice, "   ", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let task = f.service.create(f.alice, "t", "").await.unwrap();
        let patch = TaskPatch {
            title: Some(" ".into()),
            ..Default::default()
        };
        let err = f.service.update(task.id, f.alice, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_for_missing_owner_is_not_found() {
        let f = fixture().await;
        let err = f.service.create(Uuid::new_v4(), "t", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(
            err,
            ServiceError::Storage(ref e) if e.is_account_not_found()
        ));
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found_even_for_owner() {
        let f = fixture().await;
        let missing = Uuid::new_v4();

        for err in [
            f.service.get_by_id(missing, f.alice).await.unwrap_err(),
            f.service
                .update(missing, f.alice, TaskPatch::default())
                .await
                .unwrap_err(),
            f.service.delete(missing, f.alice).await.unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn test_other_owner_is_forbidden_and_storage_unchanged() {
        let f = fixture().await;
        let task = f.service.create(f.alice, "Secret", "").await.unwrap();

        let err = f.service.get_by_id(task.id, f.bob).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let patch = TaskPatch {
            title: Some("Hijacked".into()),
            completed: Some(true),
            ..Default::default()
        };
        let err = f.service.update(task.id, f.bob, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = f.service.delete(task.id, f.bob).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let stored = TaskStorage::get_by_id(f.store.as_ref(), task.id).await.unwrap();
        assert_eq!(stored, task);
    }

    #[tokio::test]
    async fn test_lists_are_isolated_per_owner() {
        let f = fixture().await;
        f.service.create(f.alice, "a1", "").await.unwrap();
        f.service.create(f.alice, "a2", "").await.unwrap();
        f.service.create(f.bob, "b1", "").await.unwrap();

        let alice = f.service.list_by_owner(f.alice).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|t| t.user_id == f.alice));
        assert_eq!(f.service.list_by_owner(f.bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_list_and_missing_owner() {
        let f = fixture().await;
        assert!(f.service.list_by_owner(f.alice).await.unwrap().is_empty());

        let err = f.service.list_by_owner(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_is_visible_through_warm_cache() {
        let f = fixture().await;
        let task = f.service.create(f.alice, "t", "").await.unwrap();

        // Warm both the entry and the list.
        f.service.get_by_id(task.id, f.alice).await.unwrap();
        f.service.list_by_owner(f.alice).await.unwrap();

        let patch = TaskPatch {
            title: Some("renamed".into()),
            ..Default::default()
        };
        f.service.update(task.id, f.alice, patch).await.unwrap();

        assert_eq!(
            f.service.get_by_id(task.id, f.alice).await.unwrap().title,
            "renamed"
        );
        assert_eq!(f.service.list_by_owner(f.alice).await.unwrap()[0].title, "renamed");
    }

    /// Task store whose every call fails like a lost database connection.
    struct BrokenTasks;

    #[async_trait]
    impl TaskStorage for BrokenTasks {
        async fn create(&self, _task: &Task) -> Result<Task, StorageError> {
            Err(StorageError::database("connection reset"))
        }
        async fn get_by_id(&self, _id: Uuid) -> Result<Task, StorageError> {
            Err(StorageError::database("connection reset"))
        }
        async fn list_by_owner(&self, _owner: Uuid) -> Result<Vec<Task>, StorageError> {
            Err(StorageError::database("connection reset"))
        }
        async fn update(&self, _task: &Task) -> Result<Task, StorageError> {
            Err(StorageError::database("connection reset"))
        }
        async fn delete(&self, _id: Uuid) -> Result<(), StorageError> {
            Err(StorageError::database("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_infrastructure() {
        let f = fixture().await;
        let service = TaskService::new(f.store.clone(), Arc::new(BrokenTasks));

        let err = service.create(f.alice, "t", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        let err = service.get_by_id(Uuid::new_v4(), f.alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        let err = service.list_by_owner(f.alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
