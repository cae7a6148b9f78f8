//! Postgres persistence: connection pool, deadline-bound queries, schema.

pub mod manager;
pub mod schema;

use async_trait::async_trait;
use thiserror::Error;

pub use manager::{bounded, build_connection_string, open, PgStore};

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Liveness probe used by the health endpoint.
#[async_trait]
pub trait StatusCheck: Send + Sync {
    async fn status_check(&self, deadline: tokio::time::Instant) -> Result<(), StoreError>;
}
