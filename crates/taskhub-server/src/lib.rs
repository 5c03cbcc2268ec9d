//! TaskHub HTTP server: account registration, login and per-user todo lists.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LogFormat, LoggingConfig, ServerConfig, StorageBackend, StorageConfig};
pub use error::ApiError;
pub use observability::init_tracing;
pub use server::{AppState, ServerBuilder, TaskhubServer, build_app};
