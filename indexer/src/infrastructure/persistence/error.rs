use thiserror::Error;

/// Error type for store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error from SeaORM
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("connection error: {0}")]
    Connection(String),

    /// Store has been closed
    #[error("store is closed")]
    Closed,

    /// Value cannot be represented in the schema
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Store refuses work; used by the in-memory store for failure injection
    #[error("store unavailable")]
    Unavailable,
}
