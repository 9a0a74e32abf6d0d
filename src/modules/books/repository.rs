//! Persistence boundary for the Books module.
//!
//! Handlers only see [`BookRepository`]; the Postgres implementation is the
//! production backend and the in-memory one serves tests and local runs
//! without a database. Every operation is a single statement, atomic at the
//! storage engine.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use super::models::Book;

/// Errors returned by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row matches the given isbn.
    #[error("There is no book with an isbn '{0}'")]
    NotFound(String),
    /// A row with the given isbn already exists.
    #[error("A book with isbn '{0}' already exists")]
    Conflict(String),
    /// The storage engine failed; fatal for the request.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Storage operations for the book resource, one per HTTP verb.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All books, ordered by title ascending with isbn as tie-break.
    async fn list_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// Exact-match lookup on the natural key.
    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepositoryError>;

    /// Insert a new row; `Conflict` if the isbn is already taken.
    async fn create(&self, book: Book) -> Result<Book, RepositoryError>;

    /// Replace every non-key field of the row matched by `isbn`.
    ///
    /// The path isbn locates the row; the body's isbn never renames the
    /// key (no key-rename operation is exposed).
    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError>;

    /// Delete the row matched by `isbn`; a second delete is `NotFound`.
    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError>;
}

/// Postgres-backed repository over the shared connection pool.
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year \
             FROM books ORDER BY title ASC, isbn ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year \
             FROM books WHERE isbn = $1",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn create(&self, book: Book) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(book.isbn.clone())
            }
            _ => RepositoryError::Storage(err),
        })
    }

    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(
            "UPDATE books \
             SET amazon_url = $2, author = $3, language = $4, pages = $5, \
                 publisher = $6, title = $7, year = $8 \
             WHERE isbn = $1 \
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(isbn.to_string()));
        }

        Ok(())
    }
}

/// In-memory repository keyed by isbn.
#[derive(Default)]
pub struct InMemoryBookRepository {
    books: RwLock<HashMap<String, Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn list_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = self.books.read().await;

        let mut books: Vec<Book> = books.values().cloned().collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.isbn.cmp(&b.isbn)));

        Ok(books)
    }

    async fn get_by_isbn(&self, isbn: &str) -> Result<Book, RepositoryError> {
        self.books
            .read()
            .await
            .get(isbn)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }

    async fn create(&self, book: Book) -> Result<Book, RepositoryError> {
        let mut books = self.books.write().await;

        if books.contains_key(&book.isbn) {
            return Err(RepositoryError::Conflict(book.isbn.clone()));
        }

        books.insert(book.isbn.clone(), book.clone());
        Ok(book)
    }

    async fn update(&self, isbn: &str, book: Book) -> Result<Book, RepositoryError> {
        let mut books = self.books.write().await;

        if !books.contains_key(isbn) {
            return Err(RepositoryError::NotFound(isbn.to_string()));
        }

        // The stored key stays authoritative regardless of the body's isbn.
        let replacement = Book {
            isbn: isbn.to_string(),
            ..book
        };
        books.insert(isbn.to_string(), replacement.clone());

        Ok(replacement)
    }

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError> {
        self.books
            .write()
            .await
            .remove(isbn)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(isbn.to_string()))
    }
}
