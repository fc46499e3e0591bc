//! Error type shared by every askdocs component.
//!
//! Each variant corresponds to one failure class of the pipeline. All of
//! them are fatal for the process; the binary reports them through
//! `anyhow` and exits non-zero.

use thiserror::Error;

/// Errors raised while configuring, indexing, or answering.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing credential, unreadable or invalid configuration, or a
    /// persisted index that does not match the configured model.
    #[error("configuration error: {0}")]
    Config(String),

    /// The document directory is missing, empty, or unreadable.
    #[error("data source error: {0}")]
    DataSource(String),

    /// A call to the embedding or chat completion service failed.
    #[error("{service} request failed: {message}")]
    Service {
        /// Which service failed (`"embeddings"` or `"chat"`).
        service: &'static str,
        /// A description of the failure.
        message: String,
    },

    /// Inconsistent input handed to a vector store.
    #[error("index error: {0}")]
    Index(String),

    /// The persisted index could not be read or written.
    #[error("persisted index error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for askdocs operations.
pub type Result<T> = std::result::Result<T, Error>;
