//! PostgreSQL connection factory, schema tooling, and catalog repositories.

use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgPool};

use library_kernel::settings::DatabaseSettings;
use library_kernel::Migration;

pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod schema;

pub use entities::{
    Author, AuthorInput, AuthorWithBooks, Book, BookAuthorRow, BookInput, BookWithAuthor,
};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;
pub use repository::{AuthorRepository, BookRepository};

/// Connection options derived from settings.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.username)
        .password(&settings.password)
        .database(&settings.name)
}

/// Open the pool and verify the server answers.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "library-db",
        host = %settings.host,
        port = settings.port,
        database = %settings.name,
        "connecting to postgres"
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(connect_options(settings))
        .await
        .with_context(|| format!("cannot open database '{}'", settings.name))?;

    ping(&pool).await?;

    tracing::info!(target: "library-db", "connected to postgres");
    Ok(pool)
}

/// Round-trip a ping over one pooled connection.
pub async fn ping(pool: &PgPool) -> anyhow::Result<()> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire a database connection")?;
    conn.ping().await.context("database ping failed")?;
    Ok(())
}

/// Run every collected schema statement. Statements are idempotent, so this
/// runs on each startup without tracking what was applied before.
pub async fn apply_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "library-db",
            module = %module,
            migration = migration.id,
            "applying schema"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
    }

    Ok(())
}
