//! Deterministic password derivation

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derive one password from the run seed, the rotation epoch, and the
/// principal identifier.
///
/// HMAC-SHA256 keyed by `seed` over `"{timestamp}:{identifier}"`, returned
/// as a 64-character lowercase hex digest. Pure and deterministic:
/// identical inputs always yield an identical output, and changing any one
/// input changes the output. The digest alphabet is a strict subset of the
/// safe-identifier class, so derived passwords always pass validation.
///
/// Deriving rather than storing is what makes the pipeline re-runnable:
/// the same run timestamp reproduces the same password, turning a retry
/// into an ensure rather than a destructive reset.
#[must_use]
pub fn derive_password(seed: &str, timestamp: &str, identifier: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(seed.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(identifier.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "my-secret-seed";
    const TIMESTAMP: &str = "1705315800";
    const IDENTIFIER: &str = "user_database";

    #[test]
    fn test_deterministic_for_same_inputs() {
        let first = derive_password(SEED, TIMESTAMP, IDENTIFIER);
        let second = derive_password(SEED, TIMESTAMP, IDENTIFIER);
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = derive_password("seed-a", TIMESTAMP, IDENTIFIER);
        let b = derive_password("seed-b", TIMESTAMP, IDENTIFIER);
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_timestamps_differ() {
        let a = derive_password(SEED, "1705315800", IDENTIFIER);
        let b = derive_password(SEED, "1705315801", IDENTIFIER);
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_identifiers_differ() {
        let a = derive_password(SEED, TIMESTAMP, "user_a");
        let b = derive_password(SEED, TIMESTAMP, "user_b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_is_64_hex_chars() {
        let password = derive_password(SEED, TIMESTAMP, IDENTIFIER);
        assert_eq!(password.len(), 64);
        assert!(password.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_separator_prevents_boundary_collisions() {
        // "ab" + "c" and "a" + "bc" must not derive the same password
        let a = derive_password(SEED, "ab", "c");
        let b = derive_password(SEED, "a", "bc");
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_passes_identifier_policy() {
        let password = derive_password(SEED, TIMESTAMP, IDENTIFIER);
        assert!(crate::utils::is_safe_identifier(&password));
    }
}
