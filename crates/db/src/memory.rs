//! In-process catalog with the same visibility rules as the PostgreSQL one.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::entities::{
    Author, AuthorInput, AuthorWithBooks, Book, BookAuthorRow, BookInput, BookWithAuthor,
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{AuthorRepository, BookRepository};

const AUTHOR: &str = "author";
const BOOK: &str = "book";

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    last_author_id: i64,
    last_book_id: i64,
}

impl Tables {
    fn live_author(&self, id: i64) -> Option<&Author> {
        self.authors.get(&id).filter(|a| a.deleted_at.is_none())
    }

    fn live_book(&self, id: i64) -> Option<&Book> {
        self.books.get(&id).filter(|b| b.deleted_at.is_none())
    }

    fn live_authors(&self) -> impl Iterator<Item = &Author> {
        self.authors.values().filter(|a| a.deleted_at.is_none())
    }

    fn live_books(&self) -> impl Iterator<Item = &Book> {
        self.books.values().filter(|b| b.deleted_at.is_none())
    }

    fn books_of(&self, author_id: i64) -> Vec<Book> {
        self.live_books()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Catalog kept entirely in memory; nothing survives the process.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorRepository for MemoryCatalog {
    async fn list(&self) -> StoreResult<Vec<Author>> {
        let tables = self.tables.read().await;
        Ok(tables.live_authors().cloned().collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Author> {
        let tables = self.tables.read().await;
        tables
            .live_author(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))
    }

    async fn create(&self, input: AuthorInput) -> StoreResult<Author> {
        let mut tables = self.tables.write().await;
        tables.last_author_id += 1;
        let now = Utc::now();
        let author = Author {
            id: tables.last_author_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: input.name,
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update(&self, id: i64, input: AuthorInput) -> StoreResult<Author> {
        let mut tables = self.tables.write().await;
        let author = tables
            .authors
            .get_mut(&id)
            .filter(|a| a.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))?;

        author.name = input.name;
        author.updated_at = Utc::now();
        Ok(author.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let author = tables
            .authors
            .get_mut(&id)
            .filter(|a| a.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))?;

        author.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn find_by_name(&self, fragment: &str) -> StoreResult<Vec<Author>> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_authors()
            .filter(|a| contains_ignore_case(&a.name, fragment))
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.live_authors().count() as i64)
    }

    async fn get_with_books(&self, id: i64) -> StoreResult<AuthorWithBooks> {
        let tables = self.tables.read().await;
        let author = tables
            .live_author(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))?;
        let books = tables.books_of(id);
        Ok(AuthorWithBooks { author, books })
    }

    async fn list_with_books(&self) -> StoreResult<Vec<AuthorWithBooks>> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_authors()
            .map(|author| AuthorWithBooks {
                author: author.clone(),
                books: tables.books_of(author.id),
            })
            .collect())
    }
}

#[async_trait]
impl BookRepository for MemoryCatalog {
    async fn list(&self) -> StoreResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.live_books().cloned().collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Book> {
        let tables = self.tables.read().await;
        tables
            .live_book(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(BOOK, id))
    }

    async fn create(&self, input: BookInput) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        tables.last_book_id += 1;
        let now = Utc::now();
        let book = Book {
            id: tables.last_book_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            title: input.title,
            page: input.page,
            stock: input.stock,
            price: input.price,
            stock_code: input.stock_code,
            isbn: input.isbn,
            author_id: input.author_id,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: i64, input: BookInput) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .get_mut(&id)
            .filter(|b| b.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found(BOOK, id))?;

        book.title = input.title;
        book.page = input.page;
        book.stock = input.stock;
        book.price = input.price;
        book.stock_code = input.stock_code;
        book.isbn = input.isbn;
        book.author_id = input.author_id;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .get_mut(&id)
            .filter(|b| b.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found(BOOK, id))?;

        book.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn find_by_title(&self, fragment: &str) -> StoreResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_books()
            .filter(|b| contains_ignore_case(&b.title, fragment))
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.live_books().count() as i64)
    }

    async fn buy(&self, id: i64, quantity: i32) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        let book = tables
            .books
            .get_mut(&id)
            .filter(|b| b.deleted_at.is_none())
            .ok_or_else(|| StoreError::not_found(BOOK, id))?;

        book.stock = book
            .stock
            .checked_sub(quantity)
            .ok_or_else(|| StoreError::Invalid {
                entity: BOOK,
                message: format!("stock {} minus {} is out of range", book.stock, quantity),
            })?;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn get_with_author(&self, id: i64) -> StoreResult<BookWithAuthor> {
        let tables = self.tables.read().await;
        let book = tables
            .live_book(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(BOOK, id))?;
        let author = tables.live_author(book.author_id).cloned();
        Ok(BookWithAuthor { book, author })
    }

    async fn list_with_author(&self) -> StoreResult<Vec<BookWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_books()
            .map(|book| BookWithAuthor {
                book: book.clone(),
                author: tables.live_author(book.author_id).cloned(),
            })
            .collect())
    }

    async fn with_pages_below(&self, pages: i32) -> StoreResult<Vec<BookAuthorRow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_books()
            .filter(|b| b.page < pages)
            .map(|book| BookAuthorRow {
                book: book.clone(),
                author_name: tables.live_author(book.author_id).map(|a| a.name.clone()),
            })
            .collect())
    }
}
