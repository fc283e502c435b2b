//! SHA-256 checksum utility for source identity.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 checksum of raw bytes as lowercase hex
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable_hex() {
        let a = compute_checksum(b"contract A {}");
        let b = compute_checksum(b"contract A {}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_differs_on_content() {
        assert_ne!(compute_checksum(b"a"), compute_checksum(b"b"));
    }
}
