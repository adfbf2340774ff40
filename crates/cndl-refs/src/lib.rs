//! Named references for cndl.
//!
//! A ref is a named, mutable pointer to an object hash, stored as a small file
//! under `<root>/refs/`. Refs are the entry points into the store: branch refs
//! (`heads/main`) point at the newest commit, staging refs (`fetch/aapl`) point
//! at chunk objects waiting to be folded into the next commit.
//!
//! # Architecture
//!
//! - Names are lower-cased before storage and lookup, and validated so they
//!   can never escape the refs directory.
//! - Every filesystem update goes through a `<ref>.lock` file, which gives
//!   both atomic replacement and a compare-and-swap for branch advancement.
//! - Refs carry no history; the commit chain is the history.
//!
//! # Modules
//!
//! - [`error`] — Error types for ref operations
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`names`] — Ref name normalization and validation
//! - [`fs`] — [`FsRefStore`], the on-disk store
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{normalize_ref_name, validate_ref_name};
pub use traits::RefStore;
