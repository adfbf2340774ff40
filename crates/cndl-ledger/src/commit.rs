//! The commit record.

use std::collections::BTreeMap;

use cndl_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// An immutable snapshot of every tracked symbol at a point in time.
///
/// Serialized as a JSON object with `parent` (hex, `""` for the root),
/// `timestamp` (seconds since the epoch), `message` and `snapshot`
/// (symbol → hex object id). The snapshot map is ordered, so the same commit
/// always produces the same bytes and therefore the same id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(with = "parent_field")]
    pub parent: Option<ObjectId>,
    pub timestamp: i64,
    pub message: String,
    pub snapshot: BTreeMap<String, ObjectId>,
}

impl Commit {
    pub fn new(
        parent: Option<ObjectId>,
        timestamp: i64,
        message: impl Into<String>,
        snapshot: BTreeMap<String, ObjectId>,
    ) -> Self {
        Self {
            parent,
            timestamp,
            message: message.into(),
            snapshot,
        }
    }

    /// Whether this is the first commit of its history.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Deterministic serialized form, as stored in the object store.
    pub fn to_bytes(&self) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| LedgerError::Encode(e.to_string()))
    }

    /// Parse stored bytes. Errors are reported against `id`.
    pub fn from_bytes(id: &ObjectId, bytes: &[u8]) -> LedgerResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| LedgerError::Corrupt {
            id: *id,
            reason: e.to_string(),
        })
    }
}

/// `Option<ObjectId>` as a hex string, with the empty string for `None`.
mod parent_field {
    use cndl_types::ObjectId;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(parent: &Option<ObjectId>, s: S) -> Result<S::Ok, S::Error> {
        match parent {
            Some(id) => s.serialize_str(&id.to_hex()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ObjectId>, D::Error> {
        let hex = String::deserialize(d)?;
        if hex.is_empty() {
            return Ok(None);
        }
        ObjectId::from_hex(&hex).map(Some).map_err(D::Error::custom)
    }
}
