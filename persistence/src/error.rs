//! Persistence port error taxonomy.

use thiserror::Error;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("optimistic concurrency conflict on {0}")]
    OptimisticConflict(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<tokio_postgres::Error> for PersistenceError {
    fn from(e: tokio_postgres::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for PersistenceError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        Self::Connection(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
