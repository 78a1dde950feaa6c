//! Password hashing. Credentials are stored as argon2 PHC strings — the
//! login flow never sees or compares plaintext against the store.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::errors::AppError;

pub fn hash_password(raw: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Constant-time verification against a stored PHC string. An unparsable
/// stored hash verifies as false rather than erroring — the caller reports
/// the same uniform login failure either way.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(verify_password("s3cret!", &hash));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(!verify_password("not-it", &hash));
    }

    #[test]
    fn test_salts_differ_per_hash() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_stored_hash_is_false() {
        assert!(!verify_password("anything", "plaintext-from-legacy-row"));
    }
}
