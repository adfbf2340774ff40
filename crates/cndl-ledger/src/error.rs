use cndl_refs::RefError;
use cndl_store::StoreError;
use cndl_types::ObjectId;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An object the ledger depends on could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The branch or a staging ref could not be read or advanced.
    #[error(transparent)]
    Refs(#[from] RefError),

    /// A commit object's bytes do not deserialize.
    #[error("corrupt commit {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    #[error("failed to encode commit: {0}")]
    Encode(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
