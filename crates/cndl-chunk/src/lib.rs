//! Chunk envelope format for cndl.
//!
//! Time-series chunks are encoded by a [`SeriesCodec`] and then wrapped in a
//! small frame before they are handed to the object store:
//!
//! ```text
//! [1 byte: encoding tag][N bytes: payload][4 bytes: CRC-32 (big-endian) of tag + payload]
//! ```
//!
//! The checksum guards against bit rot and truncation below the store. It is
//! independent of the content digest that names the object.
//!
//! # Modules
//!
//! - [`envelope`] — `wrap` / `unwrap` of the frame
//! - [`codec`] — the [`SeriesCodec`] capability and the XOR codec
//! - [`series`] — the [`Sample`] type
//! - [`synth`] — synthetic price series for demo payloads

pub mod codec;
pub mod envelope;
pub mod error;
pub mod series;
pub mod synth;
mod varint;

pub use codec::{codec_for, decode_chunk, encode_chunk, Encoding, SeriesCodec, XorCodec};
pub use envelope::{unwrap, wrap, CHECKSUM_LEN, MIN_FRAME_LEN};
pub use error::{ChunkError, ChunkResult};
pub use series::Sample;
pub use synth::{geometric_brownian_motion, GbmParams};
