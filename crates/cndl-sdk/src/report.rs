//! Plain result types returned by [`Repository`](crate::Repository) queries.

use cndl_chunk::{Encoding, Sample};
use cndl_types::ObjectId;

/// A decoded chunk object.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkReport {
    pub id: ObjectId,
    pub encoding: Encoding,
    /// Size of the stored envelope, checksum included.
    pub frame_len: usize,
    /// Size of the encoded series inside the envelope.
    pub payload_len: usize,
    pub samples: Vec<Sample>,
}

impl ChunkReport {
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// A staged symbol that the next commit would change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedSymbol {
    pub symbol: String,
    pub target: ObjectId,
    /// Value in the head snapshot; `None` for a new symbol.
    pub previous: Option<ObjectId>,
}

/// Findings of a repository integrity check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FsckReport {
    /// Number of objects re-hashed.
    pub checked: usize,
    /// Objects whose bytes no longer hash to their id.
    pub corrupt: Vec<ObjectId>,
    /// Head snapshot entries whose object is missing.
    pub dangling_snapshot: Vec<(String, ObjectId)>,
    /// Staged symbols whose object is missing.
    pub dangling_staged: Vec<(String, ObjectId)>,
    /// Set when the branch points at a missing or unreadable commit.
    pub broken_head: Option<ObjectId>,
}

impl FsckReport {
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty()
            && self.dangling_snapshot.is_empty()
            && self.dangling_staged.is_empty()
            && self.broken_head.is_none()
    }
}
