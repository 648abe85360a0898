//! Access-code hashing, verification, and generation.
//!
//! Codes are stored as a (hash, salt, hint) triple. The salted SHA-256
//! digest is the only commitment to the plaintext; the hint keeps just the
//! last few characters for admin display and never enough to narrow a guess.

use rand::distr::{Alphanumeric, SampleString};
use rand::prelude::IndexedRandom;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Characters of the plaintext kept as the admin-visible hint.
pub const CODE_HINT_LEN: usize = 4;

/// Length of the random salt stored alongside each hash.
const SALT_LEN: usize = 16;

/// Alphabet for generated codes. 0/O and 1/I are left out so codes can be
/// read over the phone without ambiguity.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

lazy_static::lazy_static! {
    /// Accepted shape for human-chosen codes: 6-64 chars of letters, digits,
    /// and hyphens.
    static ref CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9-]{6,64}$").unwrap();
}

/// Stored commitment to a plaintext access code.
#[derive(Debug, Clone)]
pub struct HashedCode {
    pub hash: String,
    pub salt: String,
    pub hint: String,
}

/// Salted digest of a code. Deterministic for a given salt so verification
/// can recompute it against the stored hash.
fn digest(code: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare two byte strings without short-circuiting on the first mismatch,
/// so the comparison time does not leak how much of a guess matched.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Hash a plaintext code with a fresh random salt.
pub fn hash_code(code: &str) -> HashedCode {
    let salt = Alphanumeric.sample_string(&mut rand::rng(), SALT_LEN);
    let hash = digest(code, &salt);
    let hint: String = code
        .chars()
        .skip(code.chars().count().saturating_sub(CODE_HINT_LEN))
        .collect();
    HashedCode { hash, salt, hint }
}

/// Verify a candidate code against a stored hash/salt pair.
///
/// Never fails on malformed input; any mismatch is simply `false`.
pub fn verify_code(code: &str, hash: &str, salt: &str) -> bool {
    constant_time_eq(digest(code, salt).as_bytes(), hash.as_bytes())
}

/// Generate a readable access code of the form `XXXX-XXXX`.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let mut pick = |n: usize| -> String {
        (0..n)
            .map(|_| *CODE_ALPHABET.choose(&mut rng).unwrap() as char)
            .collect()
    };
    format!("{}-{}", pick(4), pick(4))
}

/// Whether a human-chosen code is an acceptable shape.
pub fn is_valid_code(code: &str) -> bool {
    CODE_REGEX.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hashed = hash_code("SUMMER-2025");
        assert!(verify_code("SUMMER-2025", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn test_wrong_code_fails_verification() {
        let hashed = hash_code("SUMMER-2025");
        assert!(!verify_code("WINTER-2025", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn test_wrong_salt_fails_verification() {
        let hashed = hash_code("SUMMER-2025");
        assert!(!verify_code("SUMMER-2025", &hashed.hash, "someothersalt"));
    }

    #[test]
    fn test_malformed_stored_hash_is_false_not_panic() {
        assert!(!verify_code("SUMMER-2025", "not-a-hex-digest", "salt"));
        assert!(!verify_code("", "", ""));
    }

    #[test]
    fn test_salt_is_unpredictable_per_call() {
        let a = hash_code("SAME-CODE");
        let b = hash_code("SAME-CODE");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hint_is_plaintext_suffix() {
        let hashed = hash_code("SUMMER-2025");
        assert_eq!(hashed.hint, "2025");
    }

    #[test]
    fn test_hint_of_short_code_is_whole_code() {
        let hashed = hash_code("AB1");
        assert_eq!(hashed.hint, "AB1");
    }

    #[test]
    fn test_generated_code_shape_and_validity() {
        let code = generate_code();
        assert_eq!(code.len(), 9);
        assert_eq!(code.as_bytes()[4], b'-');
        assert!(is_valid_code(&code));
        assert!(!code.contains('O') && !code.contains('0'));
    }

    #[test]
    fn test_code_shape_validation() {
        assert!(is_valid_code("SUMMER-2025"));
        assert!(is_valid_code("abc123"));
        assert!(!is_valid_code("short"));
        assert!(!is_valid_code("has spaces in it"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"abcd", b"abcd"));
    }
}
