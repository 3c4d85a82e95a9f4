//! Sample data loading.
//!
//! Input files are JSON arrays in the same shape the HTTP API accepts. A record
//! whose exact name (authors) or title (books) already exists is left alone,
//! so seeding twice does not duplicate anything.

use std::path::Path;

use anyhow::Context;
use library_db::{AuthorInput, AuthorRepository, BookInput, BookRepository};
use serde::de::DeserializeOwned;

/// Outcome of one seeding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Read a JSON array of inputs from `path`.
pub async fn load_inputs<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read seed file {}", path.display()))?;

    serde_json::from_slice(&raw)
        .with_context(|| format!("seed file {} is not a JSON array of records", path.display()))
}

pub async fn seed_authors(
    authors: &dyn AuthorRepository,
    inputs: Vec<AuthorInput>,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for input in inputs {
        let existing = authors.find_by_name(&input.name).await?;
        if existing.iter().any(|author| author.name == input.name) {
            tracing::debug!(name = %input.name, "author already present");
            report.skipped += 1;
            continue;
        }

        let author = authors.create(input).await?;
        tracing::info!(author_id = author.id, name = %author.name, "seeded author");
        report.created += 1;
    }

    Ok(report)
}

pub async fn seed_books(
    books: &dyn BookRepository,
    inputs: Vec<BookInput>,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for input in inputs {
        let existing = books.find_by_title(&input.title).await?;
        if existing.iter().any(|book| book.title == input.title) {
            tracing::debug!(title = %input.title, "book already present");
            report.skipped += 1;
            continue;
        }

        let book = books.create(input).await?;
        tracing::info!(book_id = book.id, title = %book.title, "seeded book");
        report.created += 1;
    }

    Ok(report)
}
