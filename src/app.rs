//! Application bootstrap shared by the `library-app` binary and the CLI.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use library_db::PgCatalog;
use library_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, Catalog};
use crate::seed::{self, SeedReport};

/// Registry holding every catalog module, wired to `catalog`.
pub fn build_registry(catalog: &Catalog, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, catalog, settings);
    registry
}

/// Full HTTP application over `catalog`, middleware included.
pub fn build_app(catalog: &Catalog, settings: &Settings) -> Router {
    let registry = build_registry(catalog, settings);
    library_http::build_router(&registry, settings)
}

/// Connect, prepare the schema and serve until interrupted.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = library_db::connect(&settings.database)
        .await
        .context("database unavailable")?;
    let catalog = Catalog::from_store(Arc::new(PgCatalog::new(pool.clone())));
    let registry = build_registry(&catalog, &settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    library_db::apply_migrations(&pool, &registry.collect_migrations()).await?;
    registry.start_all(&ctx).await?;

    let served =
        library_http::start_server(&registry, &settings, library_http::shutdown_signal()).await;

    tracing::info!("shutting down");
    if let Err(err) = registry.stop_all().await {
        tracing::error!(error = ?err, "module shutdown failed");
    }
    pool.close().await;

    served
}

/// Apply every module's schema and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = library_db::connect(&settings.database).await?;
    let catalog = Catalog::from_store(Arc::new(PgCatalog::new(pool.clone())));
    let migrations = build_registry(&catalog, settings).collect_migrations();

    library_db::apply_migrations(&pool, &migrations).await?;
    pool.close().await;

    tracing::info!(count = migrations.len(), "schema applied");
    Ok(migrations.len())
}

/// Load sample authors, then books, skipping records that already exist.
pub async fn seed(
    settings: &Settings,
    authors_path: &Path,
    books_path: &Path,
) -> anyhow::Result<(SeedReport, SeedReport)> {
    let authors = seed::load_inputs(authors_path).await?;
    let books = seed::load_inputs(books_path).await?;

    let pool = library_db::connect(&settings.database).await?;
    let catalog = Catalog::from_store(Arc::new(PgCatalog::new(pool.clone())));
    let migrations = build_registry(&catalog, settings).collect_migrations();
    library_db::apply_migrations(&pool, &migrations).await?;

    let author_report = seed::seed_authors(catalog.authors.as_ref(), authors).await?;
    let book_report = seed::seed_books(catalog.books.as_ref(), books).await?;
    pool.close().await;

    tracing::info!(
        authors_created = author_report.created,
        authors_skipped = author_report.skipped,
        books_created = book_report.created,
        books_skipped = book_report.skipped,
        "seeding finished"
    );
    Ok((author_report, book_report))
}

/// Check that the configured database answers.
pub async fn ping(settings: &Settings) -> anyhow::Result<()> {
    let pool = library_db::connect(&settings.database).await?;
    pool.close().await;
    Ok(())
}
