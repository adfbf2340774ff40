//! Content digests for cndl.
//!
//! Every stored object is named by the BLAKE3 digest of its exact bytes. The
//! digest identifies content; it is not used to validate envelopes, which
//! carry their own checksum.

pub mod hasher;

pub use hasher::{digest, verify, ContentHasher};
