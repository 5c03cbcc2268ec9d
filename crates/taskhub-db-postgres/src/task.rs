//! Task storage.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use taskhub_storage::{StorageError, Task, TaskStorage};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::db_error;
use crate::storage::PostgresStorage;

type TaskRow = (Uuid, Uuid, String, String, bool, OffsetDateTime, OffsetDateTime);

fn from_tuple(row: TaskRow) -> Task {
    Task {
        id: row.0,
        user_id: row.1,
        title: row.2,
        description: row.3,
        completed: row.4,
        created_at: row.5,
        updated_at: row.6,
    }
}

#[async_trait]
impl TaskStorage for PostgresStorage {
    async fn create(&self, task: &Task) -> Result<Task, StorageError> {
        let row: TaskRow = query_as(
            r#"
            INSERT INTO todos (id, user_id, title, description, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(db_error)?;

        Ok(from_tuple(row))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Task, StorageError> {
        let row: Option<TaskRow> = query_as(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error)?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::task_not_found(id))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
        let rows: Vec<TaskRow> = query_as(
            r#"
            SELECT id, user_id, title, description, completed, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner)
        .fetch_all(self.pool())
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(from_tuple).collect())
    }

    async fn update(&self, task: &Task) -> Result<Task, StorageError> {
        // user_id is immutable.
        let row: Option<TaskRow> = query_as(
            r#"
            UPDATE todos
            SET title = $2, description = $3, completed = $4, updated_at = $5
            WHERE id = $1
            RETURNING id, user_id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(task.updated_at)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error)?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::task_not_found(task.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let result = query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::task_not_found(id));
        }

        Ok(())
    }
}
