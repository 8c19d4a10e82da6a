//! Error types for the store

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cache contents: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    #[error("Remote service rejected snapshot: {0}")]
    Rejected(String),

    #[error("Remote writer has shut down")]
    Closed,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("A batch is still open")]
    BatchOpen,
}
