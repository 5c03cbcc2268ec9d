//! # taskhub-service
//!
//! Business logic of the TaskHub server.
//!
//! - [`account`] - registration and account lookup
//! - [`task`] - task operations guarded by ownership checks
//! - [`cache`] - best-effort read-through cache wrapped around storage
//! - [`validation`] - input validators for emails, passwords and titles
//!
//! Services depend only on the storage traits from `taskhub-storage`, so any
//! backend (or a cached wrapper around one) can be injected.

pub mod account;
pub mod cache;
pub mod error;
pub mod task;
pub mod validation;

pub use account::AccountService;
pub use cache::{
    CacheBackend, CacheConfig, CachedAccountStorage, CachedTaskStorage, RedisConfig,
    create_cache_backend,
};
pub use error::{ErrorKind, ServiceError};
pub use task::TaskService;

/// Type alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;
