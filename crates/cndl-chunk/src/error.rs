use thiserror::Error;

/// Errors from chunk framing and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The frame is shorter than a tag plus checksum.
    #[error("file too small to be a valid chunk: {len} bytes, need at least {min}")]
    TooSmall { len: usize, min: usize },

    /// The trailing checksum disagrees with the frame contents.
    #[error("checksum mismatch: data is corrupted (stored {stored:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// The tag byte does not name a known encoding.
    #[error("unsupported encoding type: {0}")]
    UnsupportedEncoding(u8),

    /// The payload passed its checksum but cannot be decoded.
    #[error("corrupt chunk payload: {0}")]
    Corrupt(String),
}

/// Result alias for chunk operations.
pub type ChunkResult<T> = Result<T, ChunkError>;
