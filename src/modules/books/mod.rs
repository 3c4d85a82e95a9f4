mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, patch},
    Router,
};
use library_db::{Author, Book, BookAuthorRow, BookInput, BookRepository, BookWithAuthor};
use library_http::docs::{array_of, component, path_param, schema_ref, text_param, Operation};
use library_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use handlers::*;

const TAG: &str = "Books";

/// Books module: CRUD, search, count, purchases and the book-to-author joins.
pub struct BooksModule {
    books: Arc<dyn BookRepository>,
}

impl BooksModule {
    pub fn new(books: Arc<dyn BookRepository>) -> Self {
        Self { books }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books/", get(list_books).post(create_book))
            .route("/books/withauthors", get(list_books_with_author))
            .route("/books/find/{name}", get(find_books))
            .route("/books/lessthen/{pages}", get(books_with_pages_below))
            .route("/books/buy/{id}/{quantity}", patch(buy_book))
            .route(
                "/books/{id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .route("/books/{id}/withauthors", get(get_book_with_author))
            .route("/bookcount", get(count_books))
            .with_state(Arc::clone(&self.books))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id = || path_param("id", "Identity of the book");

        let schemas: serde_json::Map<String, serde_json::Value> = [
            component::<Author>(),
            component::<Book>(),
            component::<BookInput>(),
            component::<BookWithAuthor>(),
            component::<BookAuthorRow>(),
        ]
        .into_iter()
        .collect();

        Some(json!({
            "paths": {
                "/books/": {
                    "get": Operation::new(TAG, "List books", 200, array_of("Book"))
                        .errors(&[500])
                        .build(),
                    "post": Operation::new(TAG, "Create a book", 201, schema_ref("Book"))
                        .body(schema_ref("BookInput"))
                        .errors(&[400, 409, 500])
                        .build()
                },
                "/books/withauthors": {
                    "get": Operation::new(TAG, "List books with their author", 200, array_of("BookWithAuthor"))
                        .errors(&[500])
                        .build()
                },
                "/books/find/{name}": {
                    "get": Operation::new(TAG, "Find books by title fragment", 200, array_of("Book"))
                        .param(text_param("name", "Case-insensitive title fragment"))
                        .errors(&[500])
                        .build()
                },
                "/books/lessthen/{pages}": {
                    "get": Operation::new(TAG, "Books shorter than a page count, with author name", 200, array_of("BookAuthorRow"))
                        .param(path_param("pages", "Exclusive upper bound on page count"))
                        .errors(&[400, 500])
                        .build()
                },
                "/books/buy/{id}/{quantity}": {
                    "patch": Operation::new(TAG, "Buy copies of a book", 200, schema_ref("Book"))
                        .param(id())
                        .param(path_param("quantity", "Copies to take out of stock"))
                        .errors(&[400, 404, 422, 500])
                        .build()
                },
                "/books/{id}": {
                    "get": Operation::new(TAG, "Get a book", 200, schema_ref("Book"))
                        .param(id())
                        .errors(&[400, 404, 500])
                        .build(),
                    "put": Operation::new(TAG, "Replace a book", 200, schema_ref("Book"))
                        .param(id())
                        .body(schema_ref("BookInput"))
                        .errors(&[400, 404, 409, 500])
                        .build(),
                    "delete": Operation::new(TAG, "Soft delete a book", 200, json!({ "type": "string" }))
                        .param(id())
                        .errors(&[400, 404, 500])
                        .build()
                },
                "/books/{id}/withauthors": {
                    "get": Operation::new(TAG, "Get a book with its author", 200, schema_ref("BookWithAuthor"))
                        .param(id())
                        .errors(&[400, 404, 500])
                        .build()
                },
                "/bookcount": {
                    "get": Operation::new(TAG, "Count books", 200, json!({ "type": "integer" }))
                        .errors(&[500])
                        .build()
                }
            },
            "components": { "schemas": schemas }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: library_db::schema::BOOKS,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(books: Arc<dyn BookRepository>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(books))
}
