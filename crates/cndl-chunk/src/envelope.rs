//! The tagged, checksummed chunk frame.
//!
//! On-disk format:
//! ```text
//! [1 byte: encoding tag]
//! [N bytes: payload]
//! [4 bytes: CRC-32 of tag + payload (big-endian u32)]
//! ```

use tracing::debug;

use crate::codec::Encoding;
use crate::error::{ChunkError, ChunkResult};

/// Size of the checksum trailer.
pub const CHECKSUM_LEN: usize = 4;

/// Smallest valid frame: tag, empty payload, checksum.
pub const MIN_FRAME_LEN: usize = 1 + CHECKSUM_LEN;

/// Frame `payload` under `tag`. Never fails; an empty payload is valid.
pub fn wrap(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    frame.push(tag);
    frame.extend_from_slice(payload);
    let crc = crc32fast::hash(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Validate a frame and split it into its encoding and payload.
///
/// Checks run in order: minimum size, checksum, then the tag. A corrupted tag
/// byte therefore reports a checksum mismatch rather than an unknown encoding.
pub fn unwrap(frame: &[u8]) -> ChunkResult<(Encoding, &[u8])> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(ChunkError::TooSmall {
            len: frame.len(),
            min: MIN_FRAME_LEN,
        });
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_LEN);
    let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(ChunkError::ChecksumMismatch { stored, computed });
    }

    let tag = body[0];
    let encoding = Encoding::from_tag(tag).ok_or(ChunkError::UnsupportedEncoding(tag))?;

    debug!(%encoding, payload_len = body.len() - 1, "unwrapped chunk frame");
    Ok((encoding, &body[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const XOR: u8 = Encoding::Xor as u8;

    #[test]
    fn frame_layout() {
        let frame = wrap(XOR, b"abc");
        assert_eq!(frame.len(), 1 + 3 + CHECKSUM_LEN);
        assert_eq!(frame[0], XOR);
        assert_eq!(&frame[1..4], b"abc");
        let crc = crc32fast::hash(&frame[..4]);
        assert_eq!(&frame[4..], &crc.to_be_bytes());
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = wrap(XOR, &[]);
        assert_eq!(frame.len(), MIN_FRAME_LEN);
        let (encoding, payload) = unwrap(&frame).unwrap();
        assert_eq!(encoding, Encoding::Xor);
        assert!(payload.is_empty());
    }

    #[test]
    fn too_small_frames() {
        for len in 0..MIN_FRAME_LEN {
            let frame = vec![0u8; len];
            assert_eq!(
                unwrap(&frame).unwrap_err(),
                ChunkError::TooSmall {
                    len,
                    min: MIN_FRAME_LEN
                }
            );
        }
    }

    #[test]
    fn unknown_tag_with_valid_checksum_is_rejected() {
        let frame = wrap(0x7f, b"payload");
        assert_eq!(
            unwrap(&frame).unwrap_err(),
            ChunkError::UnsupportedEncoding(0x7f)
        );
    }

    #[test]
    fn truncated_frame_fails_checksum() {
        let frame = wrap(XOR, b"some longer payload");
        let truncated = &frame[..frame.len() - 1];
        assert!(matches!(
            unwrap(truncated),
            Err(ChunkError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn corrupted_trailer_fails_checksum() {
        let mut frame = wrap(XOR, b"payload");
        let last = frame.len() - 1;
        frame[last] ^= 0xff;
        assert!(matches!(
            unwrap(&frame),
            Err(ChunkError::ChecksumMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn wrap_unwrap_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let frame = wrap(XOR, &payload);
            let (encoding, decoded) = unwrap(&frame).unwrap();
            prop_assert_eq!(encoding, Encoding::Xor);
            prop_assert_eq!(decoded, &payload[..]);
        }

        #[test]
        fn any_single_bit_flip_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            bit in any::<proptest::sample::Index>(),
        ) {
            let mut frame = wrap(XOR, &payload);
            let bit = bit.index(frame.len() * 8);
            frame[bit / 8] ^= 1 << (bit % 8);
            let is_checksum_mismatch = matches!(
                unwrap(&frame),
                Err(ChunkError::ChecksumMismatch { .. })
            );
            prop_assert!(is_checksum_mismatch);
        }
    }
}
