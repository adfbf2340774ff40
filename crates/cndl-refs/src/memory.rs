//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] keeps refs in a `BTreeMap` behind a `RwLock`, so
//! listing comes out sorted for free. Compare-and-swap is atomic under the
//! write lock; nothing here is ever reported as [`RefError::Locked`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use cndl_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::normalize_ref_name;
use crate::traits::RefStore;

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<ObjectId> {
        let name = normalize_ref_name(name)?;
        let refs = self.refs.read().expect("lock poisoned");
        refs.get(&name).copied().ok_or(RefError::NotFound { name })
    }

    fn write_ref(&self, name: &str, target: &ObjectId) -> Result<()> {
        let name = normalize_ref_name(name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        refs.insert(name, *target);
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<()> {
        let name = normalize_ref_name(name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        match refs.remove(&name) {
            Some(_) => Ok(()),
            None => Err(RefError::NotFound { name }),
        }
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>> {
        let prefix = prefix.to_lowercase();
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .map(|(name, id)| (name.clone(), *id))
            .collect())
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> Result<()> {
        let name = normalize_ref_name(name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        let current = refs.get(&name).copied();
        if current.as_ref() != expected {
            return Err(RefError::Conflict {
                name,
                expected: expected.copied(),
                actual: current,
            });
        }
        refs.insert(name, *new);
        Ok(())
    }
}
