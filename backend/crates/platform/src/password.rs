//! Password Hashing and Verification
//!
//! - Argon2id hashing (memory-hard, salted, fixed parameters)
//! - Length policy of 8 to 72 characters, counted in Unicode scalar values
//! - NFKC normalization so visually identical input hashes identically
//! - Zeroization of plaintext on drop
//! - Constant-time verification (delegated to `argon2`)

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in characters
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Clear text password with automatic memory zeroization
///
/// Not `Clone`, and `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Accept a new password, enforcing the length policy.
    ///
    /// The length is checked on the input as typed. The stored value is the
    /// NFKC form, and the input buffer is wiped before returning.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let mut raw = raw;
        let actual = raw.chars().count();

        let verdict = if actual < MIN_PASSWORD_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual,
            })
        } else if actual > MAX_PASSWORD_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual,
            })
        } else {
            Ok(Self(raw.nfkc().collect()))
        };

        raw.zeroize();
        verdict
    }

    /// Wrap a login attempt without applying the policy.
    /// A candidate outside the policy simply fails to verify.
    pub fn candidate(raw: String) -> Self {
        let mut raw = raw;
        let normalized = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with Argon2id and a fresh 128-bit salt
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);

        // m=19456 (19 MiB), t=2, p=1
        let hash = Argon2::default()
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

/// Hashed password in PHC string format
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("correct horse".to_string()).unwrap();
/// let hashed = password.hash().unwrap();
/// assert!(hashed.verify(&password));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Load a PHC string (e.g. from the database), rejecting anything unparseable
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Check a candidate against this hash. Never errors: any failure is `false`.
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_window() {
        assert!(matches!(
            ClearTextPassword::new("a".repeat(7)),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 7 })
        ));
        assert!(ClearTextPassword::new("a".repeat(8)).is_ok());
        assert!(ClearTextPassword::new("a".repeat(72)).is_ok());
        assert!(matches!(
            ClearTextPassword::new("a".repeat(73)),
            Err(PasswordPolicyError::TooLong { max: 72, actual: 73 })
        ));
        assert!(matches!(
            ClearTextPassword::new(String::new()),
            Err(PasswordPolicyError::TooShort { .. })
        ));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 72 two-byte characters is 144 bytes but still within policy
        assert!(ClearTextPassword::new("\u{e9}".repeat(72)).is_ok());
        assert!(ClearTextPassword::new("\u{e9}".repeat(73)).is_err());
    }

    #[test]
    fn test_common_words_are_not_rejected() {
        assert!(ClearTextPassword::new("password1".to_string()).is_ok());
        assert!(ClearTextPassword::new("        ".to_string()).is_ok());
    }

    #[test]
    fn test_hash_and_verify_at_bounds() {
        for len in [MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH] {
            let password = ClearTextPassword::new("k".repeat(len)).unwrap();
            let hashed = password.hash().unwrap();
            assert!(hashed.verify(&password), "len {len}");

            let other = ClearTextPassword::candidate("j".repeat(len));
            assert!(!hashed.verify(&other), "len {len}");
        }
    }

    #[test]
    fn test_candidate_outside_policy_never_matches() {
        let password = ClearTextPassword::new("password1".to_string()).unwrap();
        let hashed = password.hash().unwrap();

        assert!(!hashed.verify(&ClearTextPassword::candidate(String::new())));
        assert!(!hashed.verify(&ClearTextPassword::candidate("x".repeat(200))));
        assert!(hashed.verify(&ClearTextPassword::candidate("password1".to_string())));
    }

    #[test]
    fn test_nfkc_equivalent_input_verifies() {
        // U+FB01 (ﬁ ligature) normalizes to "fi"
        let password = ClearTextPassword::new("\u{FB01}rst-place!".to_string()).unwrap();
        let hashed = password.hash().unwrap();
        assert!(hashed.verify(&ClearTextPassword::candidate("first-place!".to_string())));
    }

    #[test]
    fn test_salts_differ() {
        let password = ClearTextPassword::new("same-password".to_string()).unwrap();
        let a = password.hash().unwrap();
        let b = password.hash().unwrap();
        assert_ne!(a.as_phc_string(), b.as_phc_string());
        assert!(a.as_phc_string().starts_with("$argon2id$"));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash().unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password));
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(matches!(
            HashedPassword::from_phc_string("not_a_valid_hash"),
            Err(PasswordHashError::InvalidHashFormat)
        ));
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("hunter2-secret".to_string()).unwrap();
        let debug = format!("{:?}", password);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));

        let hashed = password.hash().unwrap();
        assert!(!format!("{:?}", hashed).contains("argon2"));
    }
}
