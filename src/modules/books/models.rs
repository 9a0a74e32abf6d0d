use serde::{Deserialize, Serialize};

/// Domain model for the Books module, keyed by ISBN.
///
/// Every persisted row satisfies the schema constraints; the validator in
/// [`super::schema`] is the only gate in front of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Natural key; immutable once created
    pub isbn: String,
    /// Product page URL
    pub amazon_url: String,
    /// Author of the book
    pub author: String,
    /// Language the book is written in
    pub language: String,
    /// Page count, at least 1
    pub pages: i32,
    /// Publisher of the book
    pub publisher: String,
    /// Title of the book
    pub title: String,
    /// Publication year, never in the future
    pub year: i32,
}
