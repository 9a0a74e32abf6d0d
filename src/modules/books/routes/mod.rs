//! HTTP handlers for the book resource.
//!
//! Five stateless handlers, one per verb. Create and update run the schema
//! validator before touching the repository; the validation check comes
//! before the existence check, so a malformed body returns 400 even when
//! the isbn matches no row.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use lectern_http::ApiError;

use super::repository::{BookRepository, RepositoryError};
use super::schema::{self, ValidationMode};

type Repo = Arc<dyn BookRepository>;

/// Build the resource router; mounted by the module under `/books`.
pub fn router(repository: Repo) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(repository)
}

/// GET /books
async fn list_books(State(repository): State<Repo>) -> Result<Json<Value>, ApiError> {
    let books = repository.list_all().await.map_err(into_api_error)?;

    Ok(Json(json!({ "books": books })))
}

/// GET /books/{isbn}
async fn get_book(
    State(repository): State<Repo>,
    Path(isbn): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let book = repository.get_by_isbn(&isbn).await.map_err(into_api_error)?;

    Ok(Json(json!({ "book": book })))
}

/// POST /books
async fn create_book(
    State(repository): State<Repo>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload.map_err(bad_payload)?;

    let book = schema::validate(&payload, ValidationMode::Create)
        .map_err(|violations| ApiError::validation(schema::describe(&violations)))?;

    let book = repository.create(book).await.map_err(into_api_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "book": book }))))
}

/// PUT /books/{isbn}
async fn update_book(
    State(repository): State<Repo>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(bad_payload)?;

    // 400 takes precedence over 404: validate before looking up the row.
    let book = schema::validate(&payload, ValidationMode::Update)
        .map_err(|violations| ApiError::validation(schema::describe(&violations)))?;

    let book = repository.update(&isbn, book).await.map_err(into_api_error)?;

    Ok(Json(json!({ "book": book })))
}

/// DELETE /books/{isbn}
async fn delete_book(
    State(repository): State<Repo>,
    Path(isbn): Path<String>,
) -> Result<Json<Value>, ApiError> {
    repository.remove(&isbn).await.map_err(into_api_error)?;

    Ok(Json(json!({ "message": "Book deleted" })))
}

/// A body the framework could not parse as JSON (or a missing JSON
/// content type) still answers with the error envelope, not axum's
/// plain-text rejection.
fn bad_payload(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

fn into_api_error(err: RepositoryError) -> ApiError {
    match err {
        err @ RepositoryError::NotFound(_) => ApiError::not_found(err.to_string()),
        err @ RepositoryError::Conflict(_) => ApiError::conflict(err.to_string()),
        RepositoryError::Storage(err) => ApiError::Internal(anyhow::Error::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repository::InMemoryBookRepository;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let repository: Repo = Arc::new(InMemoryBookRepository::new());
        Router::new().nest("/books", router(repository))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(payload) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };

        call(app, request).await
    }

    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        call(app, request).await
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    fn test_payload() -> Value {
        json!({
            "isbn": "0001112222",
            "amazon_url": "http://a.co/eobPtX2",
            "author": "Test Author",
            "language": "english",
            "pages": 500,
            "publisher": "Test Publisher",
            "title": "Test Book for Testing",
            "year": 2022
        })
    }

    #[tokio::test]
    async fn post_creates_a_book_and_echoes_it() {
        let app = test_app();

        let (status, body) = send(&app, Method::POST, "/books", Some(test_payload())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "book": test_payload() }));

        let (status, body) = send(&app, Method::GET, "/books/0001112222", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "book": test_payload() }));
    }

    #[tokio::test]
    async fn post_with_stringly_typed_numbers_is_400() {
        let app = test_app();
        let mut payload = test_payload();
        payload["pages"] = json!("500");
        payload["year"] = json!("2022");

        let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("pages"));
        assert!(message.contains("year"));
    }

    #[tokio::test]
    async fn post_with_missing_fields_is_400() {
        let app = test_app();
        let payload = json!({
            "isbn": "0001112222",
            "publisher": "Test Publisher",
            "title": "Test Book for Testing",
            "year": 2022
        });

        let (status, body) = send(&app, Method::POST, "/books", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("author: is required"));
    }

    #[tokio::test]
    async fn malformed_json_body_still_gets_the_error_envelope() {
        let app = test_app();

        let (status, body) = send_raw(
            &app,
            Method::POST,
            "/books",
            Some("application/json"),
            "{not valid json",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
        assert!(!body["error"]["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_content_type_still_gets_the_error_envelope() {
        let app = test_app();

        let (status, body) = send_raw(
            &app,
            Method::PUT,
            "/books/0001112222",
            None,
            &test_payload().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
    }

    #[tokio::test]
    async fn duplicate_post_is_409() {
        let app = test_app();
        send(&app, Method::POST, "/books", Some(test_payload())).await;

        let (status, body) = send(&app, Method::POST, "/books", Some(test_payload())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["status"], 409);
    }

    #[tokio::test]
    async fn list_returns_books_sorted_by_title() {
        let app = test_app();
        let mut zebra = test_payload();
        zebra["isbn"] = json!("0000000001");
        zebra["title"] = json!("Zebra");
        let mut apple = test_payload();
        apple["isbn"] = json!("0000000002");
        apple["title"] = json!("Apple");

        send(&app, Method::POST, "/books", Some(zebra)).await;
        send(&app, Method::POST, "/books", Some(apple)).await;

        let (status, body) = send(&app, Method::GET, "/books", None).await;

        assert_eq!(status, StatusCode::OK);
        let books = body["books"].as_array().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0]["title"], "Apple");
        assert_eq!(books[1]["title"], "Zebra");
    }

    #[tokio::test]
    async fn list_on_empty_store_is_an_empty_array() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/books", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "books": [] }));
    }

    #[tokio::test]
    async fn get_unknown_isbn_is_404() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/books/anything", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);
    }

    #[tokio::test]
    async fn put_replaces_every_field_and_keeps_the_key() {
        let app = test_app();
        send(&app, Method::POST, "/books", Some(test_payload())).await;

        let replacement = json!({
            "isbn": "0001112222",
            "amazon_url": "http://a.co/eobPtX2",
            "author": "Updated Author",
            "language": "english",
            "pages": 264,
            "publisher": "Updated Publisher",
            "title": "Updated Title",
            "year": 2017
        });

        let (status, body) = send(
            &app,
            Method::PUT,
            "/books/0001112222",
            Some(replacement.clone()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "book": replacement }));
    }

    #[tokio::test]
    async fn put_with_invalid_body_is_400_even_when_the_row_is_missing() {
        let app = test_app();
        let mut payload = test_payload();
        payload["pages"] = json!("500");

        let (status, body) = send(&app, Method::PUT, "/books/anything", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
    }

    #[tokio::test]
    async fn put_with_valid_body_on_missing_row_is_404() {
        let app = test_app();
        let mut payload = test_payload();
        payload["isbn"] = json!("anything");

        let (status, body) = send(&app, Method::PUT, "/books/anything", Some(payload)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);
    }

    #[tokio::test]
    async fn delete_twice_is_200_then_404() {
        let app = test_app();
        send(&app, Method::POST, "/books", Some(test_payload())).await;

        let (status, body) = send(&app, Method::DELETE, "/books/0001112222", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Book deleted" }));

        let (status, body) = send(&app, Method::DELETE, "/books/0001112222", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);
    }
}
