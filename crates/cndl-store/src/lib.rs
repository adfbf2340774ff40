//! Content-addressed object storage for cndl.
//!
//! This crate implements a hash-keyed object store analogous to git's
//! `.git/objects/` directory. Chunk envelopes and serialized commits alike are
//! stored as immutable objects identified by the digest of their bytes.
//!
//! # On-disk layout
//!
//! ```text
//! <root>/objects/<xx>/<rest>   xx = first two hex characters of the id
//! <root>/refs/...              owned by cndl-refs
//! <root>/config.toml           owned by cndl-sdk
//! ```
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- the sharded directory tree above
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. A put is durable before it returns, and a torn write is never visible
//!    under the final path.
//! 3. The store never interprets object contents.
//! 4. Prefix lookups that match more than one object are errors.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod layout;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use layout::{Layout, CONFIG_FILE, DEFAULT_REPO_DIR, OBJECTS_DIR, REFS_DIR};
pub use memory::InMemoryObjectStore;
pub use traits::{normalize_prefix, ObjectStore, MIN_PREFIX_LEN};
