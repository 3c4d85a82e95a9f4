mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use library_authz::{BearerToken, RequireBearerLayer};
use library_db::{Author, AuthorInput, AuthorRepository, AuthorWithBooks, Book};
use library_http::docs::{array_of, component, path_param, schema_ref, text_param, Operation};
use library_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use handlers::*;

const TAG: &str = "Authors";

/// Authors module: CRUD, search, count and the author-to-books join.
///
/// Every `/authors/...` route requires the bearer token; `/authorcount` is open.
pub struct AuthorsModule {
    authors: Arc<dyn AuthorRepository>,
    token: BearerToken,
}

impl AuthorsModule {
    pub fn new(authors: Arc<dyn AuthorRepository>, token: BearerToken) -> Self {
        Self { authors, token }
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let bearer = RequireBearerLayer::new(self.token.clone());

        Router::new()
            .route(
                "/authors/",
                get(list_authors)
                    .post(create_author)
                    .route_layer(bearer.clone()),
            )
            .route(
                "/authors/withbooks",
                get(list_authors_with_books).route_layer(bearer.clone()),
            )
            .route(
                "/authors/find/{name}",
                get(find_authors).route_layer(bearer.clone()),
            )
            .route(
                "/authors/{id}",
                get(get_author)
                    .put(update_author)
                    .delete(delete_author)
                    .route_layer(bearer.clone()),
            )
            .route(
                "/authors/{id}/withbooks",
                get(get_author_with_books).route_layer(bearer),
            )
            .route("/authorcount", get(count_authors))
            .with_state(Arc::clone(&self.authors))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id = || path_param("id", "Identity of the author");

        let schemas: serde_json::Map<String, serde_json::Value> = [
            component::<Author>(),
            component::<AuthorInput>(),
            component::<AuthorWithBooks>(),
            component::<Book>(),
        ]
        .into_iter()
        .collect();

        Some(json!({
            "paths": {
                "/authors/": {
                    "get": Operation::new(TAG, "List authors", 200, array_of("Author"))
                        .errors(&[401, 500])
                        .bearer()
                        .build(),
                    "post": Operation::new(TAG, "Create an author", 201, schema_ref("Author"))
                        .body(schema_ref("AuthorInput"))
                        .errors(&[400, 401, 409, 500])
                        .bearer()
                        .build()
                },
                "/authors/withbooks": {
                    "get": Operation::new(TAG, "List authors with their books", 200, array_of("AuthorWithBooks"))
                        .errors(&[401, 500])
                        .bearer()
                        .build()
                },
                "/authors/find/{name}": {
                    "get": Operation::new(TAG, "Find authors by name fragment", 200, array_of("Author"))
                        .param(text_param("name", "Case-insensitive name fragment"))
                        .errors(&[401, 500])
                        .bearer()
                        .build()
                },
                "/authors/{id}": {
                    "get": Operation::new(TAG, "Get an author", 200, schema_ref("Author"))
                        .param(id())
                        .errors(&[400, 401, 404, 500])
                        .bearer()
                        .build(),
                    "put": Operation::new(TAG, "Replace an author", 200, schema_ref("Author"))
                        .param(id())
                        .body(schema_ref("AuthorInput"))
                        .errors(&[400, 401, 404, 409, 500])
                        .bearer()
                        .build(),
                    "delete": Operation::new(TAG, "Soft delete an author", 200, json!({ "type": "string" }))
                        .param(id())
                        .errors(&[400, 401, 404, 500])
                        .bearer()
                        .build()
                },
                "/authors/{id}/withbooks": {
                    "get": Operation::new(TAG, "Get an author with books", 200, schema_ref("AuthorWithBooks"))
                        .param(id())
                        .errors(&[400, 401, 404, 500])
                        .bearer()
                        .build()
                },
                "/authorcount": {
                    "get": Operation::new(TAG, "Count authors", 200, json!({ "type": "integer" }))
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
            up: library_db::schema::AUTHORS,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// Create a new instance of the authors module
pub fn create_module(authors: Arc<dyn AuthorRepository>, token: BearerToken) -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new(authors, token))
}
