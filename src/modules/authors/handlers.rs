use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use library_db::{Author, AuthorInput, AuthorRepository, AuthorWithBooks};
use library_http::{path_number, AppError, JsonBody, PathParams};

pub(super) type Authors = Arc<dyn AuthorRepository>;

pub(super) async fn list_authors(
    State(authors): State<Authors>,
) -> Result<Json<Vec<Author>>, AppError> {
    Ok(Json(authors.list().await?))
}

pub(super) async fn get_author(
    State(authors): State<Authors>,
    PathParams(id): PathParams<String>,
) -> Result<Json<Author>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(authors.get(id).await?))
}

pub(super) async fn create_author(
    State(authors): State<Authors>,
    JsonBody(input): JsonBody<AuthorInput>,
) -> Result<(StatusCode, Json<Author>), AppError> {
    let author = authors.create(input).await?;
    tracing::info!(author_id = author.id, "author created");
    Ok((StatusCode::CREATED, Json(author)))
}

/// Full replace: fields missing from the body are reset.
pub(super) async fn update_author(
    State(authors): State<Authors>,
    PathParams(id): PathParams<String>,
    JsonBody(input): JsonBody<AuthorInput>,
) -> Result<Json<Author>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(authors.update(id, input).await?))
}

pub(super) async fn delete_author(
    State(authors): State<Authors>,
    PathParams(id): PathParams<String>,
) -> Result<Json<&'static str>, AppError> {
    let id = path_number("id", &id)?;
    authors.delete(id).await?;
    tracing::info!(author_id = id, "author deleted");
    Ok(Json("Deleted"))
}

pub(super) async fn find_authors(
    State(authors): State<Authors>,
    PathParams(name): PathParams<String>,
) -> Result<Json<Vec<Author>>, AppError> {
    Ok(Json(authors.find_by_name(&name).await?))
}

pub(super) async fn count_authors(State(authors): State<Authors>) -> Result<Json<i64>, AppError> {
    Ok(Json(authors.count().await?))
}

pub(super) async fn get_author_with_books(
    State(authors): State<Authors>,
    PathParams(id): PathParams<String>,
) -> Result<Json<AuthorWithBooks>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(authors.get_with_books(id).await?))
}

pub(super) async fn list_authors_with_books(
    State(authors): State<Authors>,
) -> Result<Json<Vec<AuthorWithBooks>>, AppError> {
    Ok(Json(authors.list_with_books().await?))
}
