//! Error types for the indexing pipeline

use thiserror::Error;

/// Main error type for indexing operations
#[derive(Error, Debug)]
pub enum StacksError {
    /// Unknown entity variant or a document missing required fields.
    /// Fails the single encode/decode call; the caller decides whether
    /// to skip or abort.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// Malformed embedded metadata XML
    #[error("metadata xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Failure reported by the underlying search engine driver.
    /// Batch-add, commit, query and delete failures all collapse into
    /// this one variant; there is no internal retry.
    #[error("search engine error: {0}")]
    Engine(String),

    /// The byte-store has no entry for the requested id
    #[error("not found in archive store: {0}")]
    NotFound(String),

    /// Any other byte-store failure
    #[error("archive store error: {0}")]
    Store(String),

    /// A package stream that could not be parsed into an entity
    #[error("invalid package: {0}")]
    InvalidPackage(String),

    #[error("config error: {0}")]
    Config(String),

    /// `add`/`remove`/`close` called on a writer that already closed
    #[error("index writer is closed")]
    WriterClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for indexing operations
pub type Result<T> = std::result::Result<T, StacksError>;
