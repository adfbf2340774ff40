use std::path::PathBuf;

use cndl_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// No object (or no shard directory) matches the prefix.
    #[error("no object matches prefix {0}")]
    PrefixNotFound(String),

    /// The prefix cannot select a shard plus at least one filename character.
    #[error("prefix too short: {prefix:?} (need at least {min} characters)")]
    PrefixTooShort { prefix: String, min: usize },

    /// More than one object matches the prefix.
    #[error("ambiguous prefix {prefix}: matches {matches} objects")]
    AmbiguousPrefix { prefix: String, matches: usize },

    /// A file inside the objects tree does not name a valid object.
    #[error("invalid object file name: {0}")]
    InvalidObjectName(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error during {op} on {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed while listing objects.
    #[error("failed to walk object directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl StoreError {
    /// Build a closure that attaches operation and path context to an I/O error.
    pub(crate) fn io(
        op: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
