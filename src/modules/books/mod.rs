pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use lectern_kernel::{InitCtx, Migration, Module};

use repository::{BookRepository, PgBookRepository};

/// Books module: validated CRUD over the `books` table.
///
/// The repository is injected at construction so handlers never reach for
/// an ambient database handle.
pub struct BooksModule {
    repository: Arc<dyn BookRepository>,
}

impl BooksModule {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
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
        routes::router(self.repository.clone())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS books (
                    isbn        text PRIMARY KEY,
                    amazon_url  text NOT NULL,
                    author      text NOT NULL,
                    language    text NOT NULL,
                    pages       integer NOT NULL CHECK (pages >= 1),
                    publisher   text NOT NULL,
                    title       text NOT NULL,
                    year        integer NOT NULL
                );
                "#,
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

/// Create a new instance of the books module backed by Postgres.
pub fn create_module(pool: sqlx::PgPool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(PgBookRepository::new(pool))))
}
