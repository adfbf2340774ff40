//! Foundation types for cndl.
//!
//! Every other cndl crate depends on `cndl-types` for the identifier that
//! names stored objects.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Content-addressed identifier (32-byte digest, hex on disk)

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{ObjectId, HEX_LEN, SHARD_LEN};
