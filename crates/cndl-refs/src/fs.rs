//! File-per-ref store under `<root>/refs/`.
//!
//! Each ref is a file whose path is the ref name and whose content is the
//! 64-character hex hash it points at. Every update goes through a git-style
//! lock file: `<ref>.lock` is created exclusively, filled with the new value,
//! fsynced, then renamed over the ref. Readers therefore see either the old
//! or the new hash, never a partial write.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cndl_store::Layout;
use cndl_types::ObjectId;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{RefError, Result};
use crate::names::{normalize_ref_name, validate_ref_name, LOCK_SUFFIX};
use crate::traits::RefStore;

/// Filesystem-backed [`RefStore`].
#[derive(Debug)]
pub struct FsRefStore {
    refs_dir: PathBuf,
}

impl FsRefStore {
    pub fn new(layout: &Layout) -> Self {
        Self {
            refs_dir: layout.refs_dir(),
        }
    }

    /// Path of the file backing a normalized ref name.
    pub fn ref_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.refs_dir.clone(), |path, part| path.join(part))
    }

    fn read_path(&self, name: &str, path: &Path) -> Result<Option<ObjectId>> {
        // A namespace directory is not a ref.
        if path.is_dir() {
            return Ok(None);
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RefError::io("read ref", path)(e)),
        };
        ObjectId::from_hex(content.trim())
            .map(Some)
            .map_err(|e| RefError::Corrupt {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Take the ref's lock, let `check` inspect the current value, then
    /// install `new`.
    fn locked_update(
        &self,
        name: &str,
        new: &ObjectId,
        check: impl FnOnce(&str, Option<ObjectId>) -> Result<()>,
    ) -> Result<()> {
        let name = normalize_ref_name(name)?;
        let path = self.ref_path(&name);
        let parent = parent_dir(&path)?;
        fs::create_dir_all(parent).map_err(RefError::io("create ref namespace", parent))?;

        let lock = LockFile::acquire(&name, &path)?;
        let current = self.read_path(&name, &path)?;
        check(&name, current)?;
        lock.commit(new, &path)?;
        sync_dir(parent).map_err(RefError::io("sync ref namespace", parent))?;

        debug!(name = %name, target = %new.short_hex(), "updated ref");
        Ok(())
    }

    /// Remove now-empty namespace directories between `path` and `refs/`.
    fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == self.refs_dir || !d.starts_with(&self.refs_dir) {
                break;
            }
            // Fails on the first directory that still has entries.
            if fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }

    /// Rebuild a ref name from a path under `refs/`.
    fn name_from_path(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.refs_dir).ok()?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<ObjectId> {
        let name = normalize_ref_name(name)?;
        let path = self.ref_path(&name);
        self.read_path(&name, &path)?
            .ok_or(RefError::NotFound { name })
    }

    fn write_ref(&self, name: &str, target: &ObjectId) -> Result<()> {
        self.locked_update(name, target, |_, _| Ok(()))
    }

    fn delete_ref(&self, name: &str) -> Result<()> {
        let name = normalize_ref_name(name)?;
        let path = self.ref_path(&name);
        if !path.is_file() {
            return Err(RefError::NotFound { name });
        }

        {
            let _lock = LockFile::acquire(&name, &path)?;
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(RefError::NotFound { name });
                }
                Err(e) => return Err(RefError::io("delete ref", &path)(e)),
            }
        }

        self.prune_empty_parents(&path);
        debug!(name = %name, "deleted ref");
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, ObjectId)>> {
        if !self.refs_dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = prefix.to_lowercase();

        let mut refs = Vec::new();
        for entry in WalkDir::new(&self.refs_dir).min_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = self.name_from_path(entry.path()) else {
                warn!(path = %entry.path().display(), "skipping ref with non UTF-8 path");
                continue;
            };
            if name.ends_with(LOCK_SUFFIX) {
                continue;
            }
            if validate_ref_name(&name).is_err() {
                warn!(path = %entry.path().display(), "skipping stray file in refs");
                continue;
            }
            if !name.starts_with(&prefix) {
                continue;
            }
            // Deleted between the walk and the read.
            if let Some(id) = self.read_path(&name, entry.path())? {
                refs.push((name, id));
            }
        }
        refs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(refs)
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<&ObjectId>,
        new: &ObjectId,
    ) -> Result<()> {
        self.locked_update(name, new, |name, current| {
            if current.as_ref() == expected {
                Ok(())
            } else {
                Err(RefError::Conflict {
                    name: name.to_string(),
                    expected: expected.copied(),
                    actual: current,
                })
            }
        })
    }
}

/// An exclusively-created `<ref>.lock` file.
///
/// Removed on drop unless [`commit`](Self::commit) renamed it over the ref.
struct LockFile {
    path: PathBuf,
    file: File,
    committed: bool,
}

impl LockFile {
    fn acquire(name: &str, ref_path: &Path) -> Result<Self> {
        let mut path = OsString::from(ref_path.as_os_str());
        path.push(LOCK_SUFFIX);
        let path = PathBuf::from(path);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => Ok(Self {
                path,
                file,
                committed: false,
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(RefError::Locked {
                name: name.to_string(),
            }),
            Err(e) => Err(RefError::io("create ref lock", &path)(e)),
        }
    }

    fn commit(mut self, target: &ObjectId, ref_path: &Path) -> Result<()> {
        self.file
            .write_all(target.to_hex().as_bytes())
            .map_err(RefError::io("write ref lock", &self.path))?;
        self.file
            .sync_all()
            .map_err(RefError::io("sync ref lock", &self.path))?;
        fs::rename(&self.path, ref_path).map_err(RefError::io("install ref", ref_path))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove ref lock");
            }
        }
    }
}

fn parent_dir(path: &Path) -> Result<&Path> {
    path.parent().ok_or_else(|| RefError::InvalidName {
        name: path.display().to_string(),
        reason: "ref has no parent directory".into(),
    })
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
