use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Uniqueness violated (duplicate e-mail or config key).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record changed since it was read.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("not found")]
    NotFound,

    /// Stored data could not be mapped back into the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(String),
}
