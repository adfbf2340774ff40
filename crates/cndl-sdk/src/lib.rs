//! High-level SDK for cndl.
//!
//! [`Repository`] is the main entry point for applications embedding cndl.
//! It ties a [`Layout`] on disk to the object store, the ref store and the
//! commit manager, and exposes the operations the `cndl` CLI is built from.

pub mod config;
pub mod error;
pub mod report;
pub mod repository;

pub use config::{RepoConfig, MAX_DEMO_STEPS};
pub use error::{SdkError, SdkResult};
pub use report::{ChunkReport, FsckReport, StagedSymbol};
pub use repository::Repository;

// Re-export key types
pub use cndl_chunk::{Encoding, GbmParams, Sample};
pub use cndl_ledger::{Commit, CommitRecord};
pub use cndl_store::{Layout, DEFAULT_REPO_DIR};
pub use cndl_types::ObjectId;
