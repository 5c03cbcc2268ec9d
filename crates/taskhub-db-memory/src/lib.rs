//! In-memory storage backend for the TaskHub server.
//!
//! This crate implements the `AccountStorage` and `TaskStorage` traits from
//! `taskhub-storage` on top of lock-protected hash maps. It is used when no
//! database is configured or reachable, and in tests.
//!
//! Data lives only as long as the process.
//!
//! # Example
//!
//! ```ignore
//! use taskhub_db_memory::InMemoryStorage;
//! use taskhub_storage::{Account, AccountStorage};
//!
//! let storage = InMemoryStorage::new();
//! let account = storage.create(&Account::new("alice@example.com", hash)).await?;
//! ```

pub mod storage;

pub use storage::InMemoryStorage;
pub use taskhub_storage::{AccountStorage, StorageError, TaskStorage};
