//! Series codecs, keyed by the envelope's encoding tag.
//!
//! The store never looks inside a chunk. Everything it needs to know about
//! an encoding is its tag byte; the codec behind a tag turns samples into
//! payload bytes and back.

use std::fmt;

use crate::envelope::{unwrap, wrap};
use crate::error::{ChunkError, ChunkResult};
use crate::series::Sample;
use crate::varint::{decode_varint, encode_varint, unzigzag, zigzag};

/// Recognized chunk encodings. The discriminant is the on-disk tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Encoding {
    /// Delta-of-delta timestamps with XOR-compressed float values.
    Xor = 1,
}

impl Encoding {
    /// The tag byte written at the front of an envelope.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte. Any unknown value yields `None`.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Xor),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xor => write!(f, "XOR"),
        }
    }
}

impl TryFrom<u8> for Encoding {
    type Error = ChunkError;

    fn try_from(tag: u8) -> ChunkResult<Self> {
        Self::from_tag(tag).ok_or(ChunkError::UnsupportedEncoding(tag))
    }
}

/// A time-series encoding.
///
/// Implementations own exactly one [`Encoding`] and must reject payloads
/// tagged with any other.
pub trait SeriesCodec: Send + Sync {
    /// The encoding this codec produces and accepts.
    fn encoding(&self) -> Encoding;

    /// Encode a series into `(encoding, payload)`.
    fn encode(&self, series: &[Sample]) -> (Encoding, Vec<u8>);

    /// Decode a payload that was tagged with `encoding`.
    fn decode(&self, encoding: Encoding, payload: &[u8]) -> ChunkResult<Vec<Sample>>;
}

/// Look up the codec for an encoding.
pub fn codec_for(encoding: Encoding) -> &'static dyn SeriesCodec {
    match encoding {
        Encoding::Xor => &XorCodec,
    }
}

/// Encode a series and wrap it into a complete envelope frame.
pub fn encode_chunk(codec: &dyn SeriesCodec, series: &[Sample]) -> Vec<u8> {
    let (encoding, payload) = codec.encode(series);
    wrap(encoding.tag(), &payload)
}

/// Validate a frame and decode its series with the matching codec.
pub fn decode_chunk(frame: &[u8]) -> ChunkResult<(Encoding, Vec<Sample>)> {
    let (encoding, payload) = unwrap(frame)?;
    let samples = codec_for(encoding).decode(encoding, payload)?;
    Ok((encoding, samples))
}

/// Gorilla-style codec: timestamps as zig-zag delta-of-delta varints, values
/// as varints of their bit pattern XORed with the previous value.
///
/// Layout: `varint(count)`, then for the first sample `zigzag(ts)` and the
/// raw big-endian value bits, then one `(zigzag(dod), varint(xor))` pair per
/// following sample.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorCodec;

impl SeriesCodec for XorCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Xor
    }

    fn encode(&self, series: &[Sample]) -> (Encoding, Vec<u8>) {
        let mut buf = Vec::with_capacity(series.len() * 4 + 16);
        encode_varint(&mut buf, series.len() as u64);

        let Some(first) = series.first() else {
            return (Encoding::Xor, buf);
        };
        encode_varint(&mut buf, zigzag(first.timestamp));
        buf.extend_from_slice(&first.value.to_bits().to_be_bytes());

        let mut prev_ts = first.timestamp;
        let mut prev_delta: i64 = 0;
        let mut prev_bits = first.value.to_bits();
        for sample in &series[1..] {
            let delta = sample.timestamp.wrapping_sub(prev_ts);
            encode_varint(&mut buf, zigzag(delta.wrapping_sub(prev_delta)));
            let bits = sample.value.to_bits();
            encode_varint(&mut buf, bits ^ prev_bits);

            prev_ts = sample.timestamp;
            prev_delta = delta;
            prev_bits = bits;
        }
        (Encoding::Xor, buf)
    }

    fn decode(&self, encoding: Encoding, payload: &[u8]) -> ChunkResult<Vec<Sample>> {
        if encoding != Encoding::Xor {
            return Err(ChunkError::UnsupportedEncoding(encoding.tag()));
        }

        let mut pos = 0;
        let (count, n) = decode_varint(payload)?;
        pos += n;
        // Every sample occupies at least one byte, so a larger count is a lie.
        if count > payload.len() as u64 {
            return Err(ChunkError::Corrupt(format!(
                "sample count {count} exceeds payload size {}",
                payload.len()
            )));
        }

        let mut samples = Vec::with_capacity(count as usize);
        if count == 0 {
            return finish(samples, pos, payload.len());
        }

        let (ts, n) = decode_varint(&payload[pos..])?;
        pos += n;
        let raw = payload
            .get(pos..pos + 8)
            .ok_or_else(|| ChunkError::Corrupt("truncated first value".into()))?;
        pos += 8;
        let mut bits_buf = [0u8; 8];
        bits_buf.copy_from_slice(raw);

        let mut prev_ts = unzigzag(ts);
        let mut prev_delta: i64 = 0;
        let mut prev_bits = u64::from_be_bytes(bits_buf);
        samples.push(Sample::new(prev_ts, f64::from_bits(prev_bits)));

        for _ in 1..count {
            let (dod, n) = decode_varint(&payload[pos..])?;
            pos += n;
            let (xor, n) = decode_varint(&payload[pos..])?;
            pos += n;

            let delta = prev_delta.wrapping_add(unzigzag(dod));
            prev_ts = prev_ts.wrapping_add(delta);
            prev_delta = delta;
            prev_bits ^= xor;
            samples.push(Sample::new(prev_ts, f64::from_bits(prev_bits)));
        }

        finish(samples, pos, payload.len())
    }
}

fn finish(samples: Vec<Sample>, consumed: usize, len: usize) -> ChunkResult<Vec<Sample>> {
    if consumed != len {
        return Err(ChunkError::Corrupt(format!(
            "{} trailing bytes after {} samples",
            len - consumed,
            samples.len()
        )));
    }
    Ok(samples)
}
