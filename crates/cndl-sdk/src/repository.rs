use cndl_chunk::{codec_for, encode_chunk, geometric_brownian_motion, unwrap, XorCodec};
use cndl_ledger::{CommitManager, CommitRecord, LedgerError};
use cndl_refs::{normalize_ref_name, FsRefStore, RefStore};
use cndl_store::{FsObjectStore, Layout, ObjectStore, StoreError};
use cndl_types::ObjectId;
use tracing::{debug, info, warn};

use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};
use crate::report::{ChunkReport, FsckReport, StagedSymbol};

/// An open cndl repository.
///
/// Bundles the on-disk layout, its configuration and the stores rooted in it.
/// Every operation goes through this handle; nothing consults the process's
/// working directory.
#[derive(Debug)]
pub struct Repository {
    layout: Layout,
    config: RepoConfig,
    objects: FsObjectStore,
    refs: FsRefStore,
}

impl Repository {
    /// Whether `layout` holds an initialized repository.
    pub fn is_initialized(layout: &Layout) -> bool {
        layout.objects_dir().is_dir() && layout.refs_dir().is_dir()
    }

    /// Create the repository directories and write `config`.
    ///
    /// Re-running `init` on an existing repository is harmless: directories
    /// are kept and an existing config file is left untouched. An invalid
    /// `config` is rejected before anything is created.
    pub fn init(layout: Layout, config: RepoConfig) -> SdkResult<Self> {
        config.validate()?;
        layout
            .create()
            .map_err(SdkError::io("create repository", layout.root()))?;

        let config_path = layout.config_path();
        if config_path.exists() {
            info!(root = %layout.root().display(), "reinitialized existing repository");
            return Self::open(layout);
        }
        config.save(&config_path)?;
        info!(root = %layout.root().display(), "initialized repository");
        Ok(Self::assemble(layout, config))
    }

    /// Open an existing repository, loading its config.
    pub fn open(layout: Layout) -> SdkResult<Self> {
        if !Self::is_initialized(&layout) {
            return Err(SdkError::NotInitialized(layout.root().to_path_buf()));
        }
        let config = RepoConfig::load(&layout.config_path())?;
        debug!(root = %layout.root().display(), branch = %config.branch, "opened repository");
        Ok(Self::assemble(layout, config))
    }

    fn assemble(layout: Layout, config: RepoConfig) -> Self {
        let objects = FsObjectStore::new(&layout);
        let refs = FsRefStore::new(&layout);
        Self {
            layout,
            config,
            objects,
            refs,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn object_store(&self) -> &FsObjectStore {
        &self.objects
    }

    pub fn ref_store(&self) -> &FsRefStore {
        &self.refs
    }

    fn ledger(&self) -> CommitManager<'_> {
        CommitManager::new(&self.objects, &self.refs)
            .with_branch(self.config.branch.clone())
            .with_staging_namespace(&self.config.staging_namespace)
    }

    // ---- Staging ----

    /// Store `bytes` and stage them under `symbol`.
    pub fn stage(&self, symbol: &str, bytes: &[u8]) -> SdkResult<ObjectId> {
        let ref_name = self.staging_ref(symbol)?;
        let id = self.objects.put(bytes)?;
        self.refs.write_ref(&ref_name, &id)?;
        debug!(symbol = %symbol.to_uppercase(), id = %id.short_hex(), "staged");
        Ok(id)
    }

    /// Generate the demo series for `symbol`, encode, wrap and stage it.
    ///
    /// Each symbol always produces the same series for the same `[demo]`
    /// parameters, so re-adding an unchanged symbol stages the same object.
    pub fn add_symbol(&self, symbol: &str) -> SdkResult<ObjectId> {
        // Validate before doing any work.
        self.staging_ref(symbol)?;
        let series = geometric_brownian_motion(&self.config.demo, seed_for(symbol));
        let frame = encode_chunk(&XorCodec, &series);
        debug!(symbol, samples = series.len(), bytes = frame.len(), "encoded demo series");
        self.stage(symbol, &frame)
    }

    fn staging_ref(&self, symbol: &str) -> SdkResult<String> {
        let invalid = |reason: &str| SdkError::InvalidSymbol {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        };
        if symbol.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if symbol.contains('/') {
            return Err(invalid("must not contain '/'"));
        }
        let name = self.ledger().staging_ref(symbol);
        normalize_ref_name(&name).map_err(|e| invalid(&e.to_string()))
    }

    /// Staged symbols whose target differs from the head snapshot.
    pub fn status(&self) -> SdkResult<Vec<StagedSymbol>> {
        let ledger = self.ledger();
        let head = ledger.head_snapshot()?;
        let changed = ledger
            .staged()?
            .into_iter()
            .filter_map(|(symbol, target)| {
                let previous = head.get(&symbol).copied();
                (previous != Some(target)).then_some(StagedSymbol {
                    symbol,
                    target,
                    previous,
                })
            })
            .collect();
        Ok(changed)
    }

    // ---- Objects ----

    /// Decode the chunk named by a hash or unique prefix.
    pub fn show(&self, prefix: &str) -> SdkResult<ChunkReport> {
        let id = self.objects.resolve(prefix)?;
        let frame = self.objects.get(&id)?;
        let (encoding, payload) =
            unwrap(&frame).map_err(|source| SdkError::Chunk { id, source })?;
        let samples = codec_for(encoding)
            .decode(encoding, payload)
            .map_err(|source| SdkError::Chunk { id, source })?;
        Ok(ChunkReport {
            id,
            encoding,
            frame_len: frame.len(),
            payload_len: payload.len(),
            samples,
        })
    }

    /// Every stored object id, sorted.
    pub fn objects(&self) -> SdkResult<Vec<ObjectId>> {
        let mut ids = self.objects.list()?;
        ids.sort();
        Ok(ids)
    }

    /// Delete the object named by a hash or unique prefix.
    ///
    /// Refs and commits pointing at it are left dangling; `fsck` reports them.
    pub fn remove(&self, prefix: &str) -> SdkResult<ObjectId> {
        let id = self.objects.resolve(prefix)?;
        self.objects.delete(&id)?;
        debug!(id = %id.short_hex(), "removed object");
        Ok(id)
    }

    // ---- History ----

    /// Fold staged symbols into a new commit. `None` uses the configured
    /// default message.
    pub fn commit(&self, message: Option<&str>) -> SdkResult<ObjectId> {
        let message = message.unwrap_or(&self.config.default_message);
        Ok(self.ledger().commit(message)?)
    }

    /// [`commit`](Self::commit) with an explicit timestamp.
    pub fn commit_at(&self, message: Option<&str>, timestamp: i64) -> SdkResult<ObjectId> {
        let message = message.unwrap_or(&self.config.default_message);
        Ok(self.ledger().commit_at(message, timestamp)?)
    }

    pub fn head(&self) -> SdkResult<Option<ObjectId>> {
        Ok(self.ledger().head()?)
    }

    pub fn read_commit(&self, id: &ObjectId) -> SdkResult<cndl_ledger::Commit> {
        Ok(self.ledger().read_commit(id)?)
    }

    /// History from the branch head, newest first.
    pub fn log(&self, limit: Option<usize>) -> SdkResult<Vec<CommitRecord>> {
        Ok(self.ledger().log(limit)?)
    }

    // ---- Integrity ----

    /// Re-hash every object and look for refs that point at nothing.
    pub fn fsck(&self) -> SdkResult<FsckReport> {
        let mut report = FsckReport::default();

        for id in self.objects()? {
            report.checked += 1;
            match self.objects.verify(&id) {
                Ok(true) => {}
                Ok(false) => report.corrupt.push(id),
                // Removed while we were walking.
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let ledger = self.ledger();
        for (symbol, id) in ledger.staged()? {
            if !self.objects.exists(&id)? {
                report.dangling_staged.push((symbol, id));
            }
        }

        if let Some(head) = ledger.head()? {
            match ledger.read_commit(&head) {
                Ok(commit) => {
                    for (symbol, id) in commit.snapshot {
                        if !self.objects.exists(&id)? {
                            report.dangling_snapshot.push((symbol, id));
                        }
                    }
                }
                Err(LedgerError::Store(StoreError::NotFound(_)))
                | Err(LedgerError::Corrupt { .. }) => report.broken_head = Some(head),
                Err(e) => return Err(e.into()),
            }
        }

        if !report.is_clean() {
            warn!(
                corrupt = report.corrupt.len(),
                dangling = report.dangling_snapshot.len() + report.dangling_staged.len(),
                broken_head = report.broken_head.is_some(),
                "repository check found problems"
            );
        }
        Ok(report)
    }
}

/// Seed for a symbol's demo series, stable across runs and casing.
fn seed_for(symbol: &str) -> u64 {
    let digest = cndl_crypto::digest(symbol.to_uppercase().as_bytes());
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(seed)
}
