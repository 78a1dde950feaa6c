//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user's identity and resolved role-id
//! set at login time. Verification is self-contained — signature + expiry
//! only, no database round-trip. The signing secret is injected through the
//! constructor so tests can run with isolated keys.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const ISSUER: &str = "backoffice";

/// Fixed validity window for session tokens.
pub const TOKEN_VALIDITY_HOURS: i64 = 72;

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role_ids: Vec<i64>,
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for the given identity. Stateless — nothing is persisted.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        role_ids: Vec<i64>,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            role_ids,
            iss: ISSUER.to_string(),
            sub: username.to_string(),
            exp: (now + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    /// Verify signature, expiry and not-before. Fails with `InvalidToken` on
    /// any mismatch; never consults the database.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_verify_round_trip() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.issue(42, "alice", vec![1, 3]).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role_ids, vec![1, 3]);
        assert_eq!(claims.sub, "alice");
    }

    #[test]
    fn test_empty_role_set_survives_round_trip() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.issue(7, "bob", vec![]).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert!(claims.role_ids.is_empty());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = TokenSigner::new("secret-a");
        let other = TokenSigner::new("secret-b");
        let token = signer.issue(1, "alice", vec![1]).unwrap();

        assert!(matches!(
            other.verify(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new("test-secret");
        // Hand-craft claims whose window closed well past the validation leeway.
        let now = Utc::now();
        let claims = Claims {
            user_id: 1,
            username: "alice".into(),
            role_ids: vec![1],
            iss: ISSUER.into(),
            sub: "alice".into(),
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(74)).timestamp(),
            nbf: (now - Duration::hours(74)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            signer.verify(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = TokenSigner::new("test-secret");
        assert!(matches!(
            signer.verify("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_validity_window_is_72h() {
        let signer = TokenSigner::new("test-secret");
        let token = signer.issue(1, "alice", vec![]).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
        assert_eq!(claims.nbf, claims.iat);
    }
}
