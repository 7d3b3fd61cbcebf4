//! Payload digests stored alongside each record.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of a cached payload.
///
/// The digest lets inspection surfaces tell identical payloads apart from
/// refreshed ones without loading the bytes.
pub fn payload_digest(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_stability() {
        let a = payload_digest(b"GIF89a...");
        let b = payload_digest(b"GIF89a...");
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_differs_by_payload() {
        assert_ne!(payload_digest(b"GIF89a"), payload_digest(b"GIF87a"));
    }

    #[test]
    fn test_digest_format() {
        let digest = payload_digest(b"");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }
}
