//! Request gatekeeper: bearer-token authentication and the coarse,
//! route-level capability gate.
//!
//! Per-request pipeline:
//! 1. `authenticate` extracts `Authorization: Bearer <token>`, verifies it and
//!    attaches an [`AuthContext`] to the request (401 on any failure).
//! 2. `capability_gate` (route groups only) loads the role rows for the
//!    context's role-id set and requires one whose code matches the group's
//!    [`Capability`] — or the `admin` wildcard (403 otherwise).
//!
//! Field-level permissions are NOT evaluated here; handlers that need them
//! call the resolver in `auth::fields` on demand.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::errors::AppError;
use crate::AppState;

/// Role code that satisfies every capability gate.
pub const ADMIN_ROLE_CODE: &str = "admin";

/// Identity attached to the request after token verification.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub username: String,
    /// Role-id set as resolved at token issuance. The coarse gate trusts it;
    /// field-level resolution re-queries the store instead.
    pub role_ids: Vec<i64>,
}

/// Capability required by a route group, e.g. `company:manage`.
/// Role codes are matched against it verbatim, plus the admin wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability(pub &'static str);

/// Whether any of the given role codes grants the capability.
pub fn grants<'a>(codes: impl IntoIterator<Item = &'a str>, capability: &Capability) -> bool {
    codes
        .into_iter()
        .any(|code| code == capability.0 || code == ADMIN_ROLE_CODE)
}

/// Middleware: verify the bearer token and attach [`AuthContext`].
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("authentication token missing".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("malformed authorization header".into()))?;

    let claims = state.signer.verify(token)?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.user_id,
        username: claims.username,
        role_ids: claims.role_ids,
    });

    Ok(next.run(req).await)
}

/// Middleware: enforce the route group's [`Capability`] against the caller's
/// roles. Role rows are loaded from the store so revoked/disabled roles drop
/// out even though the token still lists their ids.
pub async fn capability_gate(
    State(state): State<Arc<AppState>>,
    Extension(capability): Extension<Capability>,
    Extension(auth): Extension<AuthContext>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let roles = state.db.roles_by_ids(&auth.role_ids).await?;

    if !grants(roles.iter().map(|r| r.code.as_str()), &capability) {
        tracing::warn!(
            user_id = auth.user_id,
            capability = capability.0,
            "capability gate denied"
        );
        return Err(AppError::Forbidden(
            "no permission to access this resource".into(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_code_grants() {
        let cap = Capability("company:manage");
        assert!(grants(["company:manage"], &cap));
    }

    #[test]
    fn test_admin_wildcard_grants_everything() {
        assert!(grants(["admin"], &Capability("company:manage")));
        assert!(grants(["admin"], &Capability("user:manage")));
        assert!(grants(["viewer", "admin"], &Capability("apitest:manage")));
    }

    #[test]
    fn test_unrelated_codes_denied() {
        let cap = Capability("company:manage");
        assert!(!grants(["user:manage", "menu:manage"], &cap));
    }

    #[test]
    fn test_empty_role_set_denied() {
        let cap = Capability("company:manage");
        assert!(!grants(std::iter::empty::<&str>(), &cap));
    }
}
