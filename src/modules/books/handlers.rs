use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use library_db::{Book, BookAuthorRow, BookInput, BookRepository, BookWithAuthor};
use library_http::{path_number, AppError, JsonBody, PathParams};

pub(super) type Books = Arc<dyn BookRepository>;

pub(super) async fn list_books(State(books): State<Books>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(books.list().await?))
}

pub(super) async fn get_book(
    State(books): State<Books>,
    PathParams(id): PathParams<String>,
) -> Result<Json<Book>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(books.get(id).await?))
}

pub(super) async fn create_book(
    State(books): State<Books>,
    JsonBody(input): JsonBody<BookInput>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = books.create(input).await?;
    tracing::info!(book_id = book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Full replace: fields missing from the body are reset.
pub(super) async fn update_book(
    State(books): State<Books>,
    PathParams(id): PathParams<String>,
    JsonBody(input): JsonBody<BookInput>,
) -> Result<Json<Book>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(books.update(id, input).await?))
}

pub(super) async fn delete_book(
    State(books): State<Books>,
    PathParams(id): PathParams<String>,
) -> Result<Json<&'static str>, AppError> {
    let id = path_number("id", &id)?;
    books.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");
    Ok(Json("Deleted"))
}

pub(super) async fn find_books(
    State(books): State<Books>,
    PathParams(name): PathParams<String>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(books.find_by_title(&name).await?))
}

pub(super) async fn count_books(State(books): State<Books>) -> Result<Json<i64>, AppError> {
    Ok(Json(books.count().await?))
}

pub(super) async fn buy_book(
    State(books): State<Books>,
    PathParams((id, quantity)): PathParams<(String, String)>,
) -> Result<Json<Book>, AppError> {
    let id = path_number("id", &id)?;
    let quantity = path_number("quantity", &quantity)?;
    let book = books.buy(id, quantity).await?;
    tracing::info!(book_id = id, quantity, stock = book.stock, "book purchased");
    Ok(Json(book))
}

pub(super) async fn get_book_with_author(
    State(books): State<Books>,
    PathParams(id): PathParams<String>,
) -> Result<Json<BookWithAuthor>, AppError> {
    let id = path_number("id", &id)?;
    Ok(Json(books.get_with_author(id).await?))
}

pub(super) async fn list_books_with_author(
    State(books): State<Books>,
) -> Result<Json<Vec<BookWithAuthor>>, AppError> {
    Ok(Json(books.list_with_author().await?))
}

pub(super) async fn books_with_pages_below(
    State(books): State<Books>,
    PathParams(pages): PathParams<String>,
) -> Result<Json<Vec<BookAuthorRow>>, AppError> {
    let pages = path_number("pages", &pages)?;
    Ok(Json(books.with_pages_below(pages).await?))
}
