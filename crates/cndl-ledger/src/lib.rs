//! Commit history for cndl.
//!
//! This crate turns staged refs into immutable, parent-linked commits. It
//! provides:
//! - The [`Commit`] record and its deterministic JSON encoding
//! - [`CommitManager`], which builds snapshots, stores commits and advances
//!   the branch with a compare-and-swap
//! - History walks from the branch head back to the root commit

pub mod commit;
pub mod error;
pub mod manager;

pub use commit::Commit;
pub use error::{LedgerError, LedgerResult};
pub use manager::{CommitManager, CommitRecord, DEFAULT_BRANCH, DEFAULT_STAGING_NAMESPACE};
