//! Table definitions. Every statement is idempotent.

pub const AUTHORS: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id         BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    name       TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_authors_deleted_at ON authors (deleted_at);
"#;

/// `author_id` is not a foreign key; books may reference missing authors.
pub const BOOKS: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id         BIGSERIAL PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    title      TEXT NOT NULL DEFAULT '',
    page       INTEGER NOT NULL DEFAULT 0,
    stock      INTEGER NOT NULL DEFAULT 0,
    price      TEXT NOT NULL DEFAULT '',
    stock_code TEXT NOT NULL DEFAULT '',
    isbn       TEXT NOT NULL DEFAULT '',
    author_id  BIGINT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_books_deleted_at ON books (deleted_at);
"#;
