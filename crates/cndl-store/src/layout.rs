use std::io;
use std::path::{Path, PathBuf};

/// Default repository directory name at the working tree root.
pub const DEFAULT_REPO_DIR: &str = ".cndl";
/// Object subtree under the repository root.
pub const OBJECTS_DIR: &str = "objects";
/// Ref namespace under the repository root.
pub const REFS_DIR: &str = "refs";
/// Repository configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Paths of a repository on disk.
///
/// A `Layout` is plain data: it is built once from an explicit location and
/// handed to every store, so nothing in the core consults the process's
/// working directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Use `root` itself as the repository directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The repository directory `dir_name` inside `worktree`.
    pub fn in_worktree(worktree: impl AsRef<Path>, dir_name: &str) -> Self {
        Self::new(worktree.as_ref().join(dir_name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    pub fn refs_dir(&self) -> PathBuf {
        self.root.join(REFS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Create the `objects` and `refs` subtrees. Idempotent.
    pub fn create(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.objects_dir())?;
        std::fs::create_dir_all(self.refs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let layout = Layout::in_worktree("/work", DEFAULT_REPO_DIR);
        assert_eq!(layout.root(), Path::new("/work/.cndl"));
        assert_eq!(layout.objects_dir(), PathBuf::from("/work/.cndl/objects"));
        assert_eq!(layout.refs_dir(), PathBuf::from("/work/.cndl/refs"));
        assert_eq!(layout.config_path(), PathBuf::from("/work/.cndl/config.toml"));
    }

    #[test]
    fn create_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::in_worktree(tmp.path(), DEFAULT_REPO_DIR);
        assert!(!layout.root().exists());
        layout.create().unwrap();
        layout.create().unwrap();
        assert!(layout.objects_dir().is_dir());
        assert!(layout.refs_dir().is_dir());
    }
}
