use std::collections::HashMap;
use std::sync::RwLock;

use cndl_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::traits::{normalize_prefix, ObjectStore};

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects live behind a `RwLock` and are
/// cloned on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Overwrite an object's bytes in place, keeping its id.
    ///
    /// Only useful for simulating corruption.
    pub fn tamper(&self, id: &ObjectId, data: Vec<u8>) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        match map.get_mut(id) {
            Some(slot) => {
                *slot = data;
                Ok(())
            }
            None => Err(StoreError::NotFound(*id)),
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = cndl_crypto::digest(data);
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| data.to_vec());
        Ok(id)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        map.remove(id).map(|_| ()).ok_or(StoreError::NotFound(*id))
    }

    fn list(&self) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.keys().copied().collect())
    }

    fn resolve(&self, prefix: &str) -> StoreResult<ObjectId> {
        let prefix = normalize_prefix(prefix)?;
        let map = self.objects.read().expect("lock poisoned");
        let matches: Vec<ObjectId> = map
            .keys()
            .filter(|id| id.to_hex().starts_with(&prefix))
            .copied()
            .collect();
        match matches.as_slice() {
            [] => Err(StoreError::PrefixNotFound(prefix)),
            [id] => Ok(*id),
            many => Err(StoreError::AmbiguousPrefix {
                prefix,
                matches: many.len(),
            }),
        }
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"hello world").unwrap();
        assert_eq!(store.get(&id).unwrap(), b"hello world");
    }

    #[test]
    fn same_content_is_deduplicated() {
        let store = InMemoryObjectStore::new();
        let id1 = store.put(b"identical").unwrap();
        let id2 = store.put(b"identical").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_and_delete_missing() {
        let store = InMemoryObjectStore::new();
        let id = cndl_crypto::digest(b"missing");
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_removes() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"gone soon").unwrap();
        store.delete(&id).unwrap();
        assert!(!store.exists(&id).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn resolve_by_prefix() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"resolve").unwrap();
        assert_eq!(store.resolve(&id.to_hex()[..6]).unwrap(), id);
        assert!(matches!(
            store.resolve("ab"),
            Err(StoreError::PrefixTooShort { .. })
        ));
    }

    #[test]
    fn resolve_reports_ambiguity() {
        let store = InMemoryObjectStore::new();
        // 4097 objects over 4096 three-character prefixes must collide.
        let mut seen = HashMap::new();
        let mut shared = None;
        for i in 0..=4096 {
            let id = store.put(format!("obj-{i}").as_bytes()).unwrap();
            let prefix = id.to_hex()[..3].to_string();
            if seen.insert(prefix.clone(), id).is_some() {
                shared = Some(prefix);
                break;
            }
        }
        let shared = shared.expect("pigeonhole guarantees a shared prefix");
        assert!(matches!(
            store.resolve(&shared),
            Err(StoreError::AmbiguousPrefix { .. })
        ));
    }

    #[test]
    fn verify_catches_tampering() {
        let store = InMemoryObjectStore::new();
        let id = store.put(b"pristine").unwrap();
        assert!(store.verify(&id).unwrap());
        store.tamper(&id, b"rotten".to_vec()).unwrap();
        assert!(!store.verify(&id).unwrap());
    }
}
