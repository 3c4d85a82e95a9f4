//! PostgreSQL-backed catalog.
//!
//! Each write is a single conditional statement, so update, delete and buy
//! never act on a row that another request removed in between.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::entities::{
    Author, AuthorInput, AuthorWithBooks, Book, BookAuthorRow, BookInput, BookWithAuthor,
};
use crate::error::{StoreError, StoreResult};
use crate::repository::{AuthorRepository, BookRepository};

const AUTHOR: &str = "author";
const BOOK: &str = "book";

const AUTHOR_COLUMNS: &str = "id, created_at, updated_at, deleted_at, name";
const BOOK_COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, title, page, stock, price, stock_code, isbn, author_id";

/// Catalog repositories over a shared connection pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn live_books_of(&self, author_ids: &[i64]) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE author_id = ANY($1) AND deleted_at IS NULL ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(author_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn live_authors_in(&self, ids: &[i64]) -> StoreResult<HashMap<i64, Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ANY($1) AND deleted_at IS NULL"
        );
        let authors = sqlx::query_as::<_, Author>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(authors.into_iter().map(|a| (a.id, a)).collect())
    }
}

/// Build an ILIKE pattern matching `fragment` literally anywhere in the value.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl AuthorRepository for PgCatalog {
    async fn list(&self) -> StoreResult<Vec<Author>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as::<_, Author>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: i64) -> StoreResult<Author> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))
    }

    async fn create(&self, input: AuthorInput) -> StoreResult<Author> {
        let sql = format!(
            "INSERT INTO authors (name, created_at, updated_at) VALUES ($1, now(), now()) \
             RETURNING {AUTHOR_COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&sql)
            .bind(&input.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(AUTHOR, err))
    }

    async fn update(&self, id: i64, input: AuthorInput) -> StoreResult<Author> {
        let sql = format!(
            "UPDATE authors SET name = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {AUTHOR_COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(AUTHOR, err))?
            .ok_or_else(|| StoreError::not_found(AUTHOR, id))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE authors SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(AUTHOR, id));
        }
        Ok(())
    }

    async fn find_by_name(&self, fragment: &str) -> StoreResult<Vec<Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors \
             WHERE name ILIKE $1 AND deleted_at IS NULL ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Author>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn get_with_books(&self, id: i64) -> StoreResult<AuthorWithBooks> {
        let author = AuthorRepository::get(self, id).await?;
        let books = self.live_books_of(&[author.id]).await?;
        Ok(AuthorWithBooks { author, books })
    }

    async fn list_with_books(&self) -> StoreResult<Vec<AuthorWithBooks>> {
        let authors = AuthorRepository::list(self).await?;
        let ids: Vec<i64> = authors.iter().map(|a| a.id).collect();

        let mut by_author: HashMap<i64, Vec<Book>> = HashMap::new();
        for book in self.live_books_of(&ids).await? {
            by_author.entry(book.author_id).or_default().push(book);
        }

        Ok(authors
            .into_iter()
            .map(|author| {
                let books = by_author.remove(&author.id).unwrap_or_default();
                AuthorWithBooks { author, books }
            })
            .collect())
    }
}

#[async_trait]
impl BookRepository for PgCatalog {
    async fn list(&self) -> StoreResult<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as::<_, Book>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64) -> StoreResult<Book> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found(BOOK, id))
    }

    async fn create(&self, input: BookInput) -> StoreResult<Book> {
        let sql = format!(
            "INSERT INTO books \
             (title, page, stock, price, stock_code, isbn, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now()) \
             RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(&input.title)
            .bind(input.page)
            .bind(input.stock)
            .bind(&input.price)
            .bind(&input.stock_code)
            .bind(&input.isbn)
            .bind(input.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(BOOK, err))
    }

    async fn update(&self, id: i64, input: BookInput) -> StoreResult<Book> {
        let sql = format!(
            "UPDATE books SET title = $2, page = $3, stock = $4, price = $5, stock_code = $6, \
             isbn = $7, author_id = $8, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(input.page)
            .bind(input.stock)
            .bind(&input.price)
            .bind(&input.stock_code)
            .bind(&input.isbn)
            .bind(input.author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(BOOK, err))?
            .ok_or_else(|| StoreError::not_found(BOOK, id))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE books SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(BOOK, id));
        }
        Ok(())
    }

    async fn find_by_title(&self, fragment: &str) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE title ILIKE $1 AND deleted_at IS NULL ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Book>(&sql)
            .bind(contains_pattern(fragment))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn buy(&self, id: i64, quantity: i32) -> StoreResult<Book> {
        let sql = format!(
            "UPDATE books SET stock = stock - $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::from_write(BOOK, err))?
            .ok_or_else(|| StoreError::not_found(BOOK, id))
    }

    async fn get_with_author(&self, id: i64) -> StoreResult<BookWithAuthor> {
        let book = BookRepository::get(self, id).await?;
        let mut authors = self.live_authors_in(&[book.author_id]).await?;
        let author = authors.remove(&book.author_id);
        Ok(BookWithAuthor { book, author })
    }

    async fn list_with_author(&self) -> StoreResult<Vec<BookWithAuthor>> {
        let books = BookRepository::list(self).await?;
        let mut ids: Vec<i64> = books.iter().map(|b| b.author_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let authors = self.live_authors_in(&ids).await?;
        Ok(books
            .into_iter()
            .map(|book| {
                let author = authors.get(&book.author_id).cloned();
                BookWithAuthor { book, author }
            })
            .collect())
    }

    async fn with_pages_below(&self, pages: i32) -> StoreResult<Vec<BookAuthorRow>> {
        Ok(sqlx::query_as::<_, BookAuthorRow>(
            "SELECT b.id, b.created_at, b.updated_at, b.deleted_at, b.title, b.page, b.stock, \
                    b.price, b.stock_code, b.isbn, b.author_id, a.name AS author_name \
             FROM books b \
             LEFT JOIN authors a ON a.id = b.author_id AND a.deleted_at IS NULL \
             WHERE b.page < $1 AND b.deleted_at IS NULL \
             ORDER BY b.id",
        )
        .bind(pages)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCatalog;
    use crate::schema;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use std::str::FromStr;

    #[test]
    fn contains_pattern_wraps_fragment() {
        assert_eq!(contains_pattern("eco"), "%eco%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    /// A catalog living in its own schema of the `DATABASE_URL` database.
    struct Scratch {
        catalog: PgCatalog,
        admin: PgPool,
        schema: String,
    }

    impl Scratch {
        async fn new(name: &str) -> Self {
            let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
            let schema = format!("library_test_{}_{}", name, std::process::id());

            let admin = PgPool::connect(&url).await.unwrap();
            sqlx::raw_sql(&format!(
                "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
            ))
            .execute(&admin)
            .await
            .unwrap();

            let options = PgConnectOptions::from_str(&url)
                .unwrap()
                .options([("search_path", schema.as_str())]);
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .connect_with(options)
                .await
                .unwrap();
            sqlx::raw_sql(schema::AUTHORS).execute(&pool).await.unwrap();
            sqlx::raw_sql(schema::BOOKS).execute(&pool).await.unwrap();

            Self {
                catalog: PgCatalog::new(pool),
                admin,
                schema,
            }
        }

        async fn cleanup(self) {
            self.catalog.pool().close().await;
            sqlx::raw_sql(&format!("DROP SCHEMA {} CASCADE", self.schema))
                .execute(&self.admin)
                .await
                .unwrap();
        }
    }

    fn author(name: &str) -> AuthorInput {
        AuthorInput {
            name: name.to_string(),
        }
    }

    fn book(title: &str, page: i32, stock: i32, author_id: i64) -> BookInput {
        BookInput {
            title: title.to_string(),
            page,
            stock,
            price: "9.90".to_string(),
            stock_code: "SC".to_string(),
            isbn: "978".to_string(),
            author_id,
        }
    }

    /// Runs the same writes against any store and returns what the join
    /// views report as (book id, title, author name).
    async fn join_projection<S>(store: &S) -> Vec<(i64, String, Option<String>)>
    where
        S: AuthorRepository + BookRepository,
    {
        let ada = AuthorRepository::create(store, author("Ada")).await.unwrap();
        let grace = AuthorRepository::create(store, author("Grace")).await.unwrap();
        BookRepository::create(store, book("Engines", 80, 3, ada.id)).await.unwrap();
        BookRepository::create(store, book("Compilers", 90, 3, grace.id)).await.unwrap();
        BookRepository::create(store, book("Orphan", 70, 3, 99)).await.unwrap();
        let gone = BookRepository::create(store, book("Gone", 60, 3, ada.id)).await.unwrap();
        BookRepository::delete(store, gone.id).await.unwrap();
        AuthorRepository::delete(store, grace.id).await.unwrap();

        let mut rows: Vec<_> = store
            .list_with_author()
            .await
            .unwrap()
            .into_iter()
            .map(|view| (view.book.id, view.book.title, view.author.map(|a| a.name)))
            .collect();
        rows.extend(
            store
                .with_pages_below(100)
                .await
                .unwrap()
                .into_iter()
                .map(|row| (row.book.id, row.book.title, row.author_name)),
        );
        rows
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn joins_agree_with_memory_catalog() {
        let scratch = Scratch::new("joins").await;

        let expected = join_projection(&MemoryCatalog::new()).await;
        let actual = join_projection(&scratch.catalog).await;
        assert_eq!(actual, expected);
        assert_eq!(actual[0], (1, "Engines".to_string(), Some("Ada".to_string())));
        assert_eq!(actual[1], (2, "Compilers".to_string(), None));

        scratch.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn soft_deleted_rows_are_hidden_everywhere() {
        let scratch = Scratch::new("soft_delete").await;
        let pg = &scratch.catalog;

        let kept = AuthorRepository::create(pg, author("Decoder")).await.unwrap();
        let gone = AuthorRepository::create(pg, author("Encoder")).await.unwrap();
        BookRepository::create(pg, book("Live", 10, 1, gone.id)).await.unwrap();
        AuthorRepository::delete(pg, gone.id).await.unwrap();

        assert_eq!(AuthorRepository::list(pg).await.unwrap(), vec![kept.clone()]);
        assert_eq!(AuthorRepository::count(pg).await.unwrap(), 1);
        assert_eq!(pg.find_by_name("CODER").await.unwrap(), vec![kept]);
        assert!(matches!(
            AuthorRepository::get(pg, gone.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            AuthorRepository::delete(pg, gone.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            pg.get_with_books(gone.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(pg.list_with_books().await.unwrap().len(), 1);

        let book = BookRepository::create(pg, book("Short", 10, 1, 0)).await.unwrap();
        BookRepository::delete(pg, book.id).await.unwrap();
        assert_eq!(BookRepository::count(pg).await.unwrap(), 1);
        assert!(pg.find_by_title("short").await.unwrap().is_empty());
        assert!(matches!(
            pg.buy(book.id, 1).await,
            Err(StoreError::NotFound { .. })
        ));

        scratch.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn update_overwrites_every_field() {
        let scratch = Scratch::new("update").await;
        let pg = &scratch.catalog;

        let created = BookRepository::create(pg, book("Draft", 300, 4, 1)).await.unwrap();
        let updated = BookRepository::update(
            pg,
            created.id,
            BookInput {
                title: "Final".to_string(),
                ..BookInput::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.page, 0);
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.price, "");
        assert_eq!(updated.isbn, "");
        assert_eq!(updated.author_id, 0);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(BookRepository::get(pg, created.id).await.unwrap(), updated);

        assert!(matches!(
            BookRepository::update(pg, 404, BookInput::default()).await,
            Err(StoreError::NotFound { .. })
        ));

        scratch.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn buy_has_no_floor_and_rejects_overflow() {
        let scratch = Scratch::new("buy").await;
        let pg = &scratch.catalog;

        let book = BookRepository::create(pg, book("X", 100, 10, 0)).await.unwrap();
        assert_eq!(pg.buy(book.id, 3).await.unwrap().stock, 7);
        assert_eq!(pg.buy(book.id, 10).await.unwrap().stock, -3);
        assert_eq!(pg.buy(book.id, -5).await.unwrap().stock, 2);

        let err = pg.buy(book.id, i32::MIN).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { entity: "book", .. }), "{err:?}");
        assert_eq!(BookRepository::get(pg, book.id).await.unwrap().stock, 2);

        scratch.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn search_matches_wildcards_literally() {
        let scratch = Scratch::new("search").await;
        let pg = &scratch.catalog;

        BookRepository::create(pg, book("50% off", 10, 1, 0)).await.unwrap();
        BookRepository::create(pg, book("500 pages", 10, 1, 0)).await.unwrap();
        BookRepository::create(pg, book("snake_case", 10, 1, 0)).await.unwrap();
        BookRepository::create(pg, book("snakeXcase", 10, 1, 0)).await.unwrap();

        let titles = |books: Vec<Book>| books.into_iter().map(|b| b.title).collect::<Vec<_>>();
        assert_eq!(titles(pg.find_by_title("50%").await.unwrap()), ["50% off"]);
        assert_eq!(titles(pg.find_by_title("E_C").await.unwrap()), ["snake_case"]);

        scratch.cleanup().await;
    }

    #[tokio::test]
    #[ignore = "needs DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn unique_violation_is_a_conflict() {
        let scratch = Scratch::new("conflict").await;
        let pool = scratch.catalog.pool();

        sqlx::raw_sql("CREATE TABLE isbns (isbn TEXT UNIQUE); INSERT INTO isbns VALUES ('978')")
            .execute(pool)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO isbns VALUES ('978')")
            .execute(pool)
            .await
            .unwrap_err();

        assert!(matches!(
            StoreError::from_write(BOOK, err),
            StoreError::Conflict { entity: "book", .. }
        ));

        scratch.cleanup().await;
    }
}
