//! Database migration management for the PostgreSQL storage backend.
//!
//! Migrations are embedded in the binary so a single executable can bring
//! an empty database up to date.

use sqlx_core::migrate::{Migration, MigrationType};
use sqlx_postgres::PgPool;
use std::borrow::Cow;
use tracing::{info, instrument};

use crate::error::{PostgresError, Result};

/// Embedded migrations in chronological order.
///
/// Each entry is (version, description, sql). Add new files under
/// `migrations/` and list them here.
macro_rules! embedded_migrations {
    () => {
        &[(
            20250101000001i64,
            "initial_schema",
            include_str!("../../migrations/20250101000001_initial_schema.sql"),
        )]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Applies every pending migration.
///
/// Applied versions are tracked in `_sqlx_migrations`, so running this on
/// an up-to-date database is a no-op.
///
/// # Errors
///
/// Returns `PostgresError::Migration` if any migration fails.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> Result<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running database migrations (embedded)");

    let migrator = sqlx_core::migrate::Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| PostgresError::Migration(format!("Migration failed: {e}")))?;

    info!("Database migrations completed successfully");

    Ok(())
}
