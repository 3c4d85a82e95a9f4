//! Repository seams between HTTP handlers and the backing store.
//!
//! Soft-deleted rows are invisible to every method: reads skip them and
//! writes against them report `NotFound`.

use async_trait::async_trait;

use crate::entities::{
    Author, AuthorInput, AuthorWithBooks, Book, BookAuthorRow, BookInput, BookWithAuthor,
};
use crate::error::StoreResult;

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Every live author, ordered by id.
    async fn list(&self) -> StoreResult<Vec<Author>>;

    async fn get(&self, id: i64) -> StoreResult<Author>;

    /// Persist a new author; identity and timestamps are assigned here.
    async fn create(&self, input: AuthorInput) -> StoreResult<Author>;

    /// Overwrite every mutable field of the author with `id`.
    async fn update(&self, id: i64, input: AuthorInput) -> StoreResult<Author>;

    /// Soft delete; related books are left untouched.
    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Case-insensitive substring match on the name.
    async fn find_by_name(&self, fragment: &str) -> StoreResult<Vec<Author>>;

    async fn count(&self) -> StoreResult<i64>;

    async fn get_with_books(&self, id: i64) -> StoreResult<AuthorWithBooks>;

    async fn list_with_books(&self) -> StoreResult<Vec<AuthorWithBooks>>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Every live book, ordered by id.
    async fn list(&self) -> StoreResult<Vec<Book>>;

    async fn get(&self, id: i64) -> StoreResult<Book>;

    async fn create(&self, input: BookInput) -> StoreResult<Book>;

    /// Overwrite every mutable field of the book with `id`.
    async fn update(&self, id: i64, input: BookInput) -> StoreResult<Book>;

    async fn delete(&self, id: i64) -> StoreResult<()>;

    /// Case-insensitive substring match on the title.
    async fn find_by_title(&self, fragment: &str) -> StoreResult<Vec<Book>>;

    async fn count(&self) -> StoreResult<i64>;

    /// Subtract `quantity` from stock in one atomic step. No lower bound applies.
    async fn buy(&self, id: i64, quantity: i32) -> StoreResult<Book>;

    async fn get_with_author(&self, id: i64) -> StoreResult<BookWithAuthor>;

    async fn list_with_author(&self) -> StoreResult<Vec<BookWithAuthor>>;

    /// Live books with fewer than `pages` pages joined to their author's name.
    async fn with_pages_below(&self, pages: i32) -> StoreResult<Vec<BookAuthorRow>>;
}
