//! Account storage.

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use taskhub_storage::{Account, AccountStorage, StorageError};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{db_error, is_unique_violation};
use crate::storage::PostgresStorage;

type AccountRow = (Uuid, String, String, OffsetDateTime);

fn from_tuple(row: AccountRow) -> Account {
    Account {
        id: row.0,
        email: row.1,
        password_hash: row.2,
        created_at: row.3,
    }
}

/// Maps a write error, turning a unique violation on `email` into `EmailTaken`.
fn write_error(err: sqlx_core::Error, email: &str) -> StorageError {
    if is_unique_violation(&err) {
        return StorageError::email_taken(email);
    }
    db_error(err)
}

#[async_trait]
impl AccountStorage for PostgresStorage {
    async fn create(&self, account: &Account) -> Result<Account, StorageError> {
        let row: AccountRow = query_as(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| write_error(e, &account.email))?;

        Ok(from_tuple(row))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StorageError> {
        let row: Option<AccountRow> = query_as(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error)?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::account_not_found(id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, StorageError> {
        let row: Option<AccountRow> = query_as(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error)?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::account_email_not_found(email))
    }

    async fn list(&self) -> Result<Vec<Account>, StorageError> {
        let rows: Vec<AccountRow> = query_as(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(from_tuple).collect())
    }

    async fn update(&self, account: &Account) -> Result<Account, StorageError> {
        let row: Option<AccountRow> = query_as(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3
            WHERE id = $1
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| write_error(e, &account.email))?;

        row.map(from_tuple)
            .ok_or_else(|| StorageError::account_not_found(account.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StorageError> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::account_not_found(id));
        }

        Ok(())
    }
}
