//! Error types for docrag-index.

use std::path::PathBuf;

use docrag_llm::LlmError;

/// Errors raised while loading documents or building, storing, and querying an index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The source directory does not exist or is not a directory.
    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A single document could not be read or parsed.
    #[error("failed to load {}: {reason}", path.display())]
    DocumentLoad { path: PathBuf, reason: String },

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    /// Nothing has been persisted at the index location yet.
    #[error("index not found at {}; build the index first", .0.display())]
    IndexNotFound(PathBuf),

    /// The persisted data exists but is not a valid index.
    #[error("index at {} is corrupt: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("index is empty; no documents to search")]
    EmptyIndex,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
