//! Catalog records and the combined views returned by the join endpoints.
//!
//! JSON field names match the wire format existing clients already use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A row from the `authors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "DeletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(rename = "Name")]
    pub name: String,
}

/// A row from the `books` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "DeletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub title: String,
    pub page: i32,
    /// Units on hand; purchases may drive this below zero.
    pub stock: i32,
    /// Free text, never parsed as a number.
    pub price: String,
    #[serde(rename = "stockCode")]
    pub stock_code: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    /// Not enforced as a foreign key; 0 means no author.
    #[serde(rename = "AuthorID")]
    pub author_id: i64,
}

/// Mutable author fields accepted on create and update.
///
/// Omitted fields take their zero value, so an update overwrites them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AuthorInput {
    #[serde(rename = "Name")]
    pub name: String,
}

/// Mutable book fields accepted on create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookInput {
    pub title: String,
    pub page: i32,
    pub stock: i32,
    pub price: String,
    #[serde(rename = "stockCode")]
    pub stock_code: String,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    #[serde(rename = "AuthorID")]
    pub author_id: i64,
}

/// An author with its live books attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorWithBooks {
    #[serde(flatten)]
    pub author: Author,
    #[serde(rename = "Books")]
    pub books: Vec<Book>,
}

/// A book with its author attached, when that author exists and is live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookWithAuthor {
    #[serde(flatten)]
    pub book: Book,
    #[serde(rename = "Authors")]
    pub author: Option<Author>,
}

/// One row of the books-to-authors left join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookAuthorRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,
    #[serde(rename = "AuthorName")]
    pub author_name: Option<String>,
}
