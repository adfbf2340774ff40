use std::io;

use cndl_types::ObjectId;

/// Digest raw bytes into their content identifier.
///
/// Pure and deterministic: identical input always yields the same id.
pub fn digest(data: &[u8]) -> ObjectId {
    ObjectId::from_hash(*blake3::hash(data).as_bytes())
}

/// Verify that data produces the expected object ID.
pub fn verify(data: &[u8], expected: &ObjectId) -> bool {
    digest(data) == *expected
}

/// Incremental digest for content that arrives in pieces.
///
/// Produces the same id as [`digest`] over the concatenated input. Implements
/// [`io::Write`] so it can sit at the end of `io::copy`.
#[derive(Default)]
pub struct ContentHasher {
    inner: blake3::Hasher,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn finalize(&self) -> ObjectId {
        ObjectId::from_hash(*self.inner.finalize().as_bytes())
    }
}

impl io::Write for ContentHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        let data = b"hello world";
        assert_eq!(digest(data), digest(data));
    }

    #[test]
    fn digest_of_empty_input_is_fixed() {
        // BLAKE3 of the empty string.
        assert_eq!(
            digest(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn different_content_differs() {
        assert_ne!(digest(b"aaa"), digest(b"bbb"));
    }

    #[test]
    fn verify_correct_data() {
        let id = digest(b"test data");
        assert!(verify(b"test data", &id));
    }

    #[test]
    fn verify_incorrect_data() {
        let id = digest(b"original");
        assert!(!verify(b"tampered", &id));
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"hello ").update(b"world");
        assert_eq!(hasher.finalize(), digest(b"hello world"));
    }

    #[test]
    fn io_copy_into_hasher() {
        let mut hasher = ContentHasher::new();
        let mut reader: &[u8] = b"streamed content";
        io::copy(&mut reader, &mut hasher).unwrap();
        assert_eq!(hasher.finalize(), digest(b"streamed content"));
    }
}
