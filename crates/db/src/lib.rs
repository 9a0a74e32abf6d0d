//! Postgres connection pool factory and migration runner.
//!
//! The pool is opened once at process start and closed at shutdown; every
//! repository borrows it. Modules contribute their own DDL through
//! [`lectern_kernel::Migration`] and the runner applies it here.

use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use lectern_kernel::settings::DatabaseSettings;
use lectern_kernel::Migration;

/// Establish the database connection pool from settings.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        max_connections = settings.max_connections,
        "connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .connect(&settings.url)
        .await
        .context("failed to connect to database")?;

    Ok(pool)
}

/// Apply module-contributed migrations in the order given.
pub async fn run_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    tracing::info!("applying {} migrations", migrations.len());

    for (module, migration) in migrations {
        tracing::info!(module = %module, migration = migration.id, "applying migration");

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| {
                format!("failed to apply migration '{}/{}'", module, migration.id)
            })?;
    }

    Ok(())
}
