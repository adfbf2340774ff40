//! The [`RefStore`] trait defining the reference storage interface.

use cndl_types::ObjectId;

use crate::error::{RefError, Result};

/// Storage backend for named references.
///
/// A ref is a single mutable cell mapping a hierarchical name to an object
/// hash. Names are lower-cased on the way in, so every method accepts any
/// casing. Implementations must be thread-safe (`Send + Sync`).
///
/// The namespace is a convention of the callers:
///
/// - `heads/*` for branches
/// - `fetch/*` for staged symbols awaiting a commit
pub trait RefStore: Send + Sync {
    /// Read a ref. Fails with [`RefError::NotFound`] if it does not exist.
    fn read_ref(&self, name: &str) -> Result<ObjectId>;

    /// Create or overwrite a ref.
    fn write_ref(&self, name: &str, target: &ObjectId) -> Result<()>;

    /// Remove a ref. Fails with [`RefError::NotFound`] if it does not exist.
    fn delete_ref(&self, name: &str) -> Result<()>;

    /// All refs whose normalized name starts with `prefix`, sorted by name.
    ///
    /// Pass `""` to list every ref, `"fetch/"` for staged symbols.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>>;

    /// Point `name` at `new` only if it currently holds `expected`.
    ///
    /// `expected = None` means the ref must not exist yet. Fails with
    /// [`RefError::Conflict`] if the current value differs and with
    /// [`RefError::Locked`] if another writer is mid-update.
    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> Result<()>;

    /// Like [`read_ref`](Self::read_ref), but an absent ref is `None`.
    fn try_read_ref(&self, name: &str) -> Result<Option<ObjectId>> {
        match self.read_ref(name) {
            Ok(id) => Ok(Some(id)),
            Err(RefError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
