//! Tests for the authentication pipeline: token issuance → verification →
//! coarse capability matching, plus the JSON error envelope the gatekeeper
//! produces on denial.
//!
//! These run without Postgres or Redis — they exercise the stateless pieces
//! the request gatekeeper is assembled from.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use backoffice::auth::gate::{grants, Capability};
use backoffice::auth::jwt::TokenSigner;
use backoffice::errors::AppError;

mod token_flow {
    use super::*;

    /// A token issued for an admin-role holder passes any capability gate
    /// once its role codes are loaded.
    #[test]
    fn test_admin_token_passes_company_gate() {
        let signer = TokenSigner::new("flow-secret");
        let token = signer.issue(1, "root", vec![10]).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.role_ids, vec![10]);

        // Role id 10 resolves to code "admin" in the store.
        let codes = ["admin"];
        assert!(grants(codes, &Capability("company:manage")));
    }

    /// A token with an empty role set verifies fine but fails every gate.
    #[test]
    fn test_roleless_token_fails_gate() {
        let signer = TokenSigner::new("flow-secret");
        let token = signer.issue(2, "limited", vec![]).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert!(claims.role_ids.is_empty());
        assert!(!grants(
            std::iter::empty::<&str>(),
            &Capability("company:manage")
        ));
    }

    /// Matching is by role code, not role name: only the exact capability
    /// string (or the wildcard) passes.
    #[test]
    fn test_capability_matches_exact_code_only() {
        assert!(grants(["company:manage"], &Capability("company:manage")));
        assert!(!grants(["company:read"], &Capability("company:manage")));
        assert!(!grants(["company"], &Capability("company:manage")));
    }

    /// Tokens survive a round-trip between two signers sharing a secret —
    /// the verifier needs no state beyond the key.
    #[test]
    fn test_verification_is_stateless() {
        let issuer = TokenSigner::new("shared-secret");
        let verifier = TokenSigner::new("shared-secret");

        let token = issuer.issue(7, "carol", vec![2, 5]).unwrap();
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role_ids, vec![2, 5]);
    }
}

mod envelopes {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unauthenticated_envelope() {
        let (status, body) = body_json(AppError::Unauthenticated(
            "authentication token missing".into(),
        ))
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "authentication token missing");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_forbidden_envelope() {
        let (status, body) = body_json(AppError::Forbidden(
            "no permission to access this resource".into(),
        ))
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 403);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_already_exists_envelope() {
        let (status, body) =
            body_json(AppError::AlreadyExists("company code already exists".into())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 409);
    }

    #[tokio::test]
    async fn test_infrastructure_errors_do_not_leak() {
        let (status, body) =
            body_json(AppError::Internal(anyhow::anyhow!("pool exhausted at 10.0.0.5"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal server error");
    }
}
