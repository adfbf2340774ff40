//! Building, persisting and walking commits.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use cndl_refs::RefStore;
use cndl_store::ObjectStore;
use cndl_types::ObjectId;
use tracing::{debug, info};

use crate::commit::Commit;
use crate::error::LedgerResult;

/// Branch advanced by commits unless configured otherwise.
pub const DEFAULT_BRANCH: &str = "heads/main";

/// Ref namespace holding staged symbols unless configured otherwise.
pub const DEFAULT_STAGING_NAMESPACE: &str = "fetch";

/// A commit together with the id it is stored under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: ObjectId,
    pub commit: Commit,
}

/// Folds staged refs into commits and advances a branch.
///
/// The manager stores nothing of its own: commit bytes go to the object store,
/// the branch tip and staged symbols live in the ref store.
pub struct CommitManager<'a> {
    objects: &'a dyn ObjectStore,
    refs: &'a dyn RefStore,
    branch: String,
    staging_namespace: String,
}

impl<'a> CommitManager<'a> {
    pub fn new(objects: &'a dyn ObjectStore, refs: &'a dyn RefStore) -> Self {
        Self {
            objects,
            refs,
            branch: DEFAULT_BRANCH.to_string(),
            staging_namespace: DEFAULT_STAGING_NAMESPACE.to_string(),
        }
    }

    /// Advance `branch` instead of [`DEFAULT_BRANCH`].
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Collect staged symbols from `namespace/*` instead of `fetch/*`.
    pub fn with_staging_namespace(mut self, namespace: &str) -> Self {
        self.staging_namespace = namespace.trim_end_matches('/').to_lowercase();
        self
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn staging_namespace(&self) -> &str {
        &self.staging_namespace
    }

    /// Ref name under which `symbol` is staged.
    pub fn staging_ref(&self, symbol: &str) -> String {
        format!("{}/{}", self.staging_namespace, symbol.to_lowercase())
    }

    /// The commit the branch points at, if any.
    pub fn head(&self) -> LedgerResult<Option<ObjectId>> {
        Ok(self.refs.try_read_ref(&self.branch)?)
    }

    /// Staged symbols and their targets, keyed by upper-cased symbol.
    pub fn staged(&self) -> LedgerResult<BTreeMap<String, ObjectId>> {
        let prefix = format!("{}/", self.staging_namespace);
        let staged = self
            .refs
            .list_refs(&prefix)?
            .into_iter()
            .filter_map(|(name, id)| {
                let symbol = name.strip_prefix(&prefix)?;
                Some((symbol.to_uppercase(), id))
            })
            .collect();
        Ok(staged)
    }

    /// Snapshot of the current head commit, or empty before the first commit.
    pub fn head_snapshot(&self) -> LedgerResult<BTreeMap<String, ObjectId>> {
        match self.head()? {
            Some(head) => Ok(self.read_commit(&head)?.snapshot),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Commit the staged symbols with the current wall-clock time.
    pub fn commit(&self, message: &str) -> LedgerResult<ObjectId> {
        self.commit_at(message, now_secs())
    }

    /// Commit the staged symbols with an explicit timestamp.
    ///
    /// The new snapshot is the parent's snapshot overlaid with every staged
    /// symbol. The commit object is durably stored before the branch moves,
    /// and the branch only moves if it still points at the parent read here.
    pub fn commit_at(&self, message: &str, timestamp: i64) -> LedgerResult<ObjectId> {
        let parent = self.head()?;
        let mut snapshot = match &parent {
            Some(parent) => self.read_commit(parent)?.snapshot,
            None => BTreeMap::new(),
        };
        let staged = self.staged()?;
        let staged_count = staged.len();
        snapshot.extend(staged);

        let commit = Commit::new(parent, timestamp, message, snapshot);
        let id = self.objects.put(&commit.to_bytes()?)?;
        debug!(id = %id.short_hex(), "stored commit object");

        self.refs
            .compare_and_swap(&self.branch, parent.as_ref(), &id)?;

        info!(
            id = %id.short_hex(),
            branch = %self.branch,
            staged = staged_count,
            symbols = commit.snapshot.len(),
            "committed snapshot"
        );
        Ok(id)
    }

    /// Load and parse a commit object.
    pub fn read_commit(&self, id: &ObjectId) -> LedgerResult<Commit> {
        let bytes = self.objects.get(id)?;
        Commit::from_bytes(id, &bytes)
    }

    /// History from the branch head back to the root, newest first.
    ///
    /// `limit` caps the number of commits returned.
    pub fn log(&self, limit: Option<usize>) -> LedgerResult<Vec<CommitRecord>> {
        let mut history = Vec::new();
        let mut next = self.head()?;
        while let Some(id) = next {
            if limit.is_some_and(|limit| history.len() >= limit) {
                break;
            }
            let commit = self.read_commit(&id)?;
            next = commit.parent;
            history.push(CommitRecord { id, commit });
        }
        Ok(history)
    }
}

impl std::fmt::Debug for CommitManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitManager")
            .field("branch", &self.branch)
            .field("staging_namespace", &self.staging_namespace)
            .finish()
    }
}

/// Current wall-clock time in seconds since the UNIX epoch.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
