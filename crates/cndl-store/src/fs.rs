//! Sharded filesystem object store.
//!
//! One file per object with a single level of fan-out:
//! `{root}/objects/{hex[0..2]}/{hex[2..]}`.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cndl_crypto::ContentHasher;
use cndl_types::{ObjectId, SHARD_LEN};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::layout::Layout;
use crate::traits::{normalize_prefix, ObjectStore};

/// Temporary files live next to their final path and start with this prefix,
/// which can never collide with a hex object name.
const TMP_PREFIX: &str = ".tmp-";

/// Filesystem-backed object store.
///
/// Writes are atomic: data goes to a temporary file in the shard directory,
/// is fsynced, then linked into place without clobbering. A reader either
/// sees the complete object or no file at all.
pub struct FsObjectStore {
    objects_dir: PathBuf,
}

impl FsObjectStore {
    /// Open the object store of a repository layout.
    ///
    /// Does not create anything; see [`Layout::create`].
    pub fn new(layout: &Layout) -> Self {
        Self {
            objects_dir: layout.objects_dir(),
        }
    }

    /// Path at which an object lives (whether or not it exists).
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (shard, rest) = id.shard_parts();
        self.objects_dir.join(shard).join(rest)
    }

    /// Resolve a hex prefix to the path of the single object it names.
    ///
    /// The first two characters select the shard directory; the rest must be
    /// a prefix of exactly one filename in it.
    pub fn resolve_path(&self, prefix: &str) -> StoreResult<PathBuf> {
        let prefix = normalize_prefix(prefix)?;
        let (shard, rest) = prefix.split_at(SHARD_LEN);
        let shard_dir = self.objects_dir.join(shard);

        let entries = match fs::read_dir(&shard_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::PrefixNotFound(prefix));
            }
            Err(e) => return Err(StoreError::io("read shard", &shard_dir)(e)),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreError::io("read shard", &shard_dir))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(TMP_PREFIX) && name.starts_with(rest) {
                matches.push(entry.path());
            }
        }

        match matches.len() {
            0 => Err(StoreError::PrefixNotFound(prefix)),
            1 => Ok(matches.remove(0)),
            n => Err(StoreError::AmbiguousPrefix { prefix, matches: n }),
        }
    }

    /// Rebuild an object ID from a file's shard directory and name.
    fn id_from_path(path: &Path) -> Option<ObjectId> {
        let name = path.file_name()?.to_str()?;
        let shard = path.parent()?.file_name()?.to_str()?;
        if shard.len() != SHARD_LEN {
            return None;
        }
        ObjectId::from_hex(&format!("{shard}{name}")).ok()
    }

    fn write_new(&self, id: &ObjectId, path: &Path, data: &[u8]) -> StoreResult<()> {
        let shard_dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidObjectName(path.display().to_string()))?;
        fs::create_dir_all(shard_dir).map_err(StoreError::io("create shard", shard_dir))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .tempfile_in(shard_dir)
            .map_err(StoreError::io("create temp object", shard_dir))?;
        tmp.write_all(data)
            .map_err(StoreError::io("write temp object", tmp.path()))?;
        set_readable(tmp.as_file()).map_err(StoreError::io("chmod temp object", tmp.path()))?;
        tmp.as_file()
            .sync_all()
            .map_err(StoreError::io("sync temp object", tmp.path()))?;

        match tmp.persist_noclobber(path) {
            Ok(_) => {}
            // Another writer stored the same content first. Same id, same
            // bytes, so theirs is as good as ours; the temp file is dropped.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %id.short_hex(), "object appeared during write");
                return Ok(());
            }
            Err(e) => return Err(StoreError::io("persist object", path)(e.error)),
        }

        sync_dir(shard_dir).map_err(StoreError::io("sync shard", shard_dir))?;
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, data: &[u8]) -> StoreResult<ObjectId> {
        let id = cndl_crypto::digest(data);
        let path = self.object_path(&id);

        // Content-addressing: an existing file at this path holds these bytes.
        if path
            .try_exists()
            .map_err(StoreError::io("stat object", &path))?
        {
            debug!(id = %id.short_hex(), "object already stored");
            return Ok(id);
        }

        self.write_new(&id, &path, data)?;
        debug!(id = %id.short_hex(), size = data.len(), "stored object");
        Ok(id)
    }

    fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let path = self.object_path(id);
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*id)),
            Err(e) => Err(StoreError::io("read object", &path)(e)),
        }
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let path = self.object_path(id);
        path.try_exists().map_err(StoreError::io("stat object", &path))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<()> {
        let path = self.object_path(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(id = %id.short_hex(), "deleted object");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(*id)),
            Err(e) => Err(StoreError::io("delete object", &path)(e)),
        }
    }

    fn list(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.objects_dir).min_depth(2).max_depth(2) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            match Self::id_from_path(entry.path()) {
                Some(id) => ids.push(id),
                None => warn!(path = %entry.path().display(), "skipping stray file in object store"),
            }
        }
        Ok(ids)
    }

    fn resolve(&self, prefix: &str) -> StoreResult<ObjectId> {
        let path = self.resolve_path(prefix)?;
        Self::id_from_path(&path)
            .ok_or_else(|| StoreError::InvalidObjectName(path.display().to_string()))
    }

    fn verify(&self, id: &ObjectId) -> StoreResult<bool> {
        let path = self.object_path(id);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(*id)),
            Err(e) => return Err(StoreError::io("open object", &path)(e)),
        };
        let mut hasher = ContentHasher::new();
        io::copy(&mut file, &mut hasher).map_err(StoreError::io("hash object", &path))?;
        let computed = hasher.finalize();
        if computed != *id {
            warn!(id = %id, computed = %computed, "object content does not match its id");
        }
        Ok(computed == *id)
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("objects_dir", &self.objects_dir)
            .finish()
    }
}

/// Objects are world-readable like any other repository file.
#[cfg(unix)]
fn set_readable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_readable(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Flush a directory entry so a rename into it survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsObjectStore) {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path().join(".cndl"));
        layout.create().unwrap();
        let store = FsObjectStore::new(&layout);
        (tmp, store)
    }

    fn file_count(dir: &Path) -> usize {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .count()
    }

    /// Drop a file with an arbitrary name into a shard directory.
    fn plant(store: &FsObjectStore, shard: &str, name: &str) -> PathBuf {
        let dir = store.objects_dir.join(shard);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, b"planted").unwrap();
        path
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let (_tmp, store) = store();
        let id = store.put(b"hello world").unwrap();
        assert_eq!(id, cndl_crypto::digest(b"hello world"));
        assert_eq!(store.get(&id).unwrap(), b"hello world");
    }

    #[test]
    fn object_lands_in_shard_directory() {
        let (_tmp, store) = store();
        let id = store.put(b"sharded").unwrap();
        let hex = id.to_hex();
        let expected = store.objects_dir.join(&hex[..2]).join(&hex[2..]);
        assert_eq!(store.object_path(&id), expected);
        assert!(expected.is_file());
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_tmp, store) = store();
        let id = cndl_crypto::digest(b"never written");
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn exists_tracks_put_and_delete() {
        let (_tmp, store) = store();
        let id = store.put(b"present").unwrap();
        assert!(store.exists(&id).unwrap());
        store.delete(&id).unwrap();
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_tmp, store) = store();
        let id = store.put(b"to-delete").unwrap();
        store.delete(&id).unwrap();
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    // -----------------------------------------------------------------------
    // Content-addressing correctness
    // -----------------------------------------------------------------------

    #[test]
    fn put_is_idempotent() {
        let (_tmp, store) = store();
        let id1 = store.put(b"identical content").unwrap();
        let id2 = store.put(b"identical content").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(file_count(&store.objects_dir), 1);
    }

    #[test]
    fn empty_content_is_stored_once() {
        let (_tmp, store) = store();
        let id1 = store.put(&[]).unwrap();
        let id2 = store.put(&[]).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(file_count(&store.objects_dir), 1);
        assert!(store.get(&id1).unwrap().is_empty());
    }

    #[test]
    fn put_does_not_rewrite_existing_file() {
        let (_tmp, store) = store();
        let id = store.put(b"original").unwrap();
        let path = store.object_path(&id);
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        store.put(b"original").unwrap();
        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let (_tmp, store) = store();
        for i in 0..20 {
            store.put(format!("object-{i}").as_bytes()).unwrap();
        }
        for entry in WalkDir::new(&store.objects_dir).into_iter().filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy();
            assert!(!name.starts_with(TMP_PREFIX), "leftover temp file {name}");
        }
    }

    #[test]
    fn concurrent_puts_converge() {
        use std::sync::Arc;
        use std::thread;

        let (_tmp, store) = store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.put(b"shared data").unwrap())
            })
            .collect();
        let ids: Vec<ObjectId> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(file_count(&store.objects_dir), 1);
        assert_eq!(store.get(&ids[0]).unwrap(), b"shared data");
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn list_reconstructs_ids() {
        let (_tmp, store) = store();
        let mut expected: Vec<ObjectId> = (0..10)
            .map(|i| store.put(format!("list-{i}").as_bytes()).unwrap())
            .collect();
        let mut listed = store.list().unwrap();
        expected.sort();
        listed.sort();
        assert_eq!(listed, expected);
    }

    #[test]
    fn list_empty_store() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_skips_stray_files() {
        let (_tmp, store) = store();
        let id = store.put(b"real").unwrap();
        plant(&store, "ab", "not-a-hash");
        plant(&store, "ab", ".tmp-leftover");
        assert_eq!(store.list().unwrap(), vec![id]);
    }

    // -----------------------------------------------------------------------
    // Prefix resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_path_rejects_short_prefix() {
        let (_tmp, store) = store();
        for prefix in ["", "a", "ab"] {
            assert!(matches!(
                store.resolve_path(prefix),
                Err(StoreError::PrefixTooShort { .. })
            ));
        }
    }

    #[test]
    fn resolve_path_unique_match() {
        let (_tmp, store) = store();
        let name = format!("1c2d{}", "0".repeat(58));
        let planted = plant(&store, "ab", &name);
        plant(&store, "ab", &format!("2{}", "0".repeat(61)));
        assert_eq!(store.resolve_path("ab1").unwrap(), planted);
    }

    #[test]
    fn resolve_path_ambiguous_match() {
        let (_tmp, store) = store();
        plant(&store, "ab", &format!("1c2d{}", "0".repeat(58)));
        plant(&store, "ab", &format!("1fff{}", "0".repeat(58)));
        match store.resolve_path("ab1") {
            Err(StoreError::AmbiguousPrefix { prefix, matches }) => {
                assert_eq!(prefix, "ab1");
                assert_eq!(matches, 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
        // A longer prefix disambiguates.
        assert!(store.resolve_path("ab1c").is_ok());
    }

    #[test]
    fn resolve_path_missing_shard() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.resolve_path("ff0"),
            Err(StoreError::PrefixNotFound(_))
        ));
    }

    #[test]
    fn resolve_path_no_match_in_shard() {
        let (_tmp, store) = store();
        plant(&store, "ab", &format!("1{}", "0".repeat(61)));
        assert!(matches!(
            store.resolve_path("ab9"),
            Err(StoreError::PrefixNotFound(_))
        ));
    }

    #[test]
    fn resolve_ignores_temp_files() {
        let (_tmp, store) = store();
        let id = store.put(b"only one").unwrap();
        let hex = id.to_hex();
        plant(&store, &hex[..2], &format!("{TMP_PREFIX}{}", &hex[2..]));
        assert_eq!(store.resolve(&hex[..3]).unwrap(), id);
    }

    #[test]
    fn resolve_full_and_uppercase_hex() {
        let (_tmp, store) = store();
        let id = store.put(b"resolve me").unwrap();
        assert_eq!(store.resolve(&id.to_hex()).unwrap(), id);
        assert_eq!(store.resolve(&id.to_hex()[..8].to_uppercase()).unwrap(), id);
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    #[test]
    fn verify_detects_tampering() {
        let (_tmp, store) = store();
        let id = store.put(b"verify me").unwrap();
        assert!(store.verify(&id).unwrap());

        fs::write(store.object_path(&id), b"tampered").unwrap();
        assert!(!store.verify(&id).unwrap());
    }

    #[test]
    fn verify_missing_is_not_found() {
        let (_tmp, store) = store();
        let id = cndl_crypto::digest(b"absent");
        assert!(matches!(store.verify(&id), Err(StoreError::NotFound(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn get_after_put_returns_bytes(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let (_tmp, store) = store();
            let id = store.put(&data).unwrap();
            prop_assert_eq!(store.get(&id).unwrap(), data);
        }
    }
}
