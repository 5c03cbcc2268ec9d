//! # taskhub-storage
//!
//! Storage abstraction layer for the TaskHub server.
//!
//! This crate defines the entities and traits that every storage backend must
//! implement. It contains no implementations; those live in
//! `taskhub-db-postgres` (durable) and `taskhub-db-memory` (volatile).
//!
//! ## Example
//!
//! ```ignore
//! use taskhub_storage::{TaskStorage, StorageError, Task};
//! use uuid::Uuid;
//!
//! async fn titles(storage: &dyn TaskStorage, owner: Uuid) -> Result<Vec<String>, StorageError> {
//!     let tasks = storage.list_by_owner(owner).await?;
//!     Ok(tasks.into_iter().map(|t| t.title).collect())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::StorageError;
pub use traits::{AccountStorage, TaskStorage};
pub use types::{Account, Task, TaskPatch};

/// Type alias for storage results.
pub type StorageResult<T> = Result<T, StorageError>;
