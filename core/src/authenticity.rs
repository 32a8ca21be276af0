//! Product authenticity check over scanned QR content.
//!
//! The content is hashed with SHA-256 and the digest is handed to a
//! [`ClassificationStrategy`]. [`LastNibbleParity`] is a stand-in until a
//! real manufacturer registry is available; swapping it does not touch
//! persistence or the HTTP layer.

use crate::types::ScanResult;
use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of the exact input bytes (64 characters).
#[must_use]
pub fn content_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Decides whether a digest belongs to a genuine product.
pub trait ClassificationStrategy: Send + Sync {
    /// Classify a lower-case hex digest.
    fn classify(&self, digest: &str) -> ScanResult;
}

/// Even final hex nibble is genuine, odd is a warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastNibbleParity;

impl ClassificationStrategy for LastNibbleParity {
    fn classify(&self, digest: &str) -> ScanResult {
        let nibble = digest
            .chars()
            .next_back()
            .and_then(|c| c.to_digit(16));
        match nibble {
            Some(n) if n % 2 == 0 => ScanResult::Genuine,
            _ => ScanResult::Warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            content_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parity_of_last_nibble() {
        let strategy = LastNibbleParity;
        assert_eq!(strategy.classify("00a"), ScanResult::Genuine);
        assert_eq!(strategy.classify("00f"), ScanResult::Warning);
        assert_eq!(strategy.classify(""), ScanResult::Warning);
    }

    proptest! {
        #[test]
        fn digest_is_deterministic_and_well_formed(content in ".*") {
            let first = content_digest(&content);
            let second = content_digest(&content);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), 64);
            prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            prop_assert_eq!(LastNibbleParity.classify(&first), LastNibbleParity.classify(&second));
        }
    }
}
