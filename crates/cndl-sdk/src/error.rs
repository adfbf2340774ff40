use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a cndl repository: {} (run `cndl init`)", .0.display())]
    NotInitialized(PathBuf),

    #[error("invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("I/O error during {op} on {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] cndl_store::StoreError),

    #[error(transparent)]
    Ref(#[from] cndl_refs::RefError),

    #[error(transparent)]
    Ledger(#[from] cndl_ledger::LedgerError),

    #[error("object {id} is not a valid chunk: {source}")]
    Chunk {
        id: cndl_types::ObjectId,
        #[source]
        source: cndl_chunk::ChunkError,
    },
}

impl SdkError {
    pub(crate) fn io(
        op: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
