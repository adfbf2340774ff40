//! Error types for reference operations.

use std::path::PathBuf;

use cndl_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The ref name is not usable as a path under `refs/`.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The ref file exists but does not hold a valid hash.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// A compare-and-swap found a different value than expected.
    #[error(
        "ref {name} moved: expected {}, found {}",
        describe(expected),
        describe(actual)
    )]
    Conflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// Another writer holds the ref's lock file.
    #[error("ref {name} is locked by another writer")]
    Locked { name: String },

    /// I/O error during file-based ref operations.
    #[error("I/O error during {op} on {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed while listing refs.
    #[error("failed to walk refs directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl RefError {
    pub(crate) fn io(
        op: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

fn describe(id: &Option<ObjectId>) -> String {
    match id {
        Some(id) => id.short_hex(),
        None => "nothing".into(),
    }
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
