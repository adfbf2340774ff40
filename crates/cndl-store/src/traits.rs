use cndl_types::{ObjectId, SHARD_LEN};

use crate::error::{StoreError, StoreResult};

/// Shortest prefix that selects a shard plus at least one filename character.
pub const MIN_PREFIX_LEN: usize = SHARD_LEN + 1;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same bytes always produce the
///   same ID, and a second put of them is a no-op.
/// - `put` does not return until the object is durable.
/// - The store never interprets object contents.
/// - Deleting an object does not touch refs or commits that point at it.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store `data` and return its content-addressed ID. Idempotent.
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId>;

    /// Read an object's bytes. Fails with [`StoreError::NotFound`] if absent.
    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Remove an object. Fails with [`StoreError::NotFound`] if absent.
    fn delete(&self, id: &ObjectId) -> StoreResult<()>;

    /// Every stored ID, in no particular order.
    fn list(&self) -> StoreResult<Vec<ObjectId>>;

    /// Resolve a hex prefix (at least [`MIN_PREFIX_LEN`] characters) to the
    /// single object it names.
    fn resolve(&self, prefix: &str) -> StoreResult<ObjectId>;

    /// Re-hash an object's stored bytes and compare against its ID.
    fn verify(&self, id: &ObjectId) -> StoreResult<bool> {
        let data = self.get(id)?;
        Ok(cndl_crypto::verify(&data, id))
    }
}

/// Lower-case a user-supplied prefix and reject ones that are too short.
pub fn normalize_prefix(prefix: &str) -> StoreResult<String> {
    let prefix = prefix.trim().to_ascii_lowercase();
    if prefix.len() < MIN_PREFIX_LEN {
        return Err(StoreError::PrefixTooShort {
            prefix,
            min: MIN_PREFIX_LEN,
        });
    }
    // Object names are pure hex; anything else cannot match.
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StoreError::PrefixNotFound(prefix));
    }
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn prefix_is_lowercased() {
        assert_eq!(normalize_prefix("AB1C").unwrap(), "ab1c");
    }

    #[test]
    fn non_hex_prefix_matches_nothing() {
        assert!(matches!(
            normalize_prefix("xyz1"),
            Err(StoreError::PrefixNotFound(_))
        ));
    }

    #[test]
    fn three_chars_is_enough() {
        assert_eq!(normalize_prefix("ab1").unwrap(), "ab1");
    }

    proptest! {
        #[test]
        fn short_prefixes_are_rejected(prefix in "[0-9a-f]{0,2}") {
            let rejected = matches!(
                normalize_prefix(&prefix),
                Err(StoreError::PrefixTooShort { min: MIN_PREFIX_LEN, .. })
            );
            prop_assert!(rejected);
        }
    }
}
