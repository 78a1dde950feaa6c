//! Credential lifecycle endpoints: the HTTP face of
//! `dingtalk::credentials::CredentialService`.
//!
//! `app_secret` never appears in responses (redacted at the serializer).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{ok, Envelope, PageData, Pagination};
use crate::dingtalk::credentials::CredentialUpdate;
use crate::errors::AppError;
use crate::store::postgres::CredentialRow;
use crate::AppState;

#[derive(Deserialize)]
pub struct CompanyIdParams {
    pub company_id: i64,
}

#[derive(Deserialize)]
pub struct CreateCredentialRequest {
    pub company_id: i64,
    pub app_key: String,
    pub app_secret: String,
}

#[derive(Deserialize)]
pub struct UpdateCredentialRequest {
    pub app_key: String,
    pub app_secret: String,
    pub status: i16,
}

/// GET /api/v1/access-token?company_id= — current credential, transparently
/// refreshed when expired.
pub async fn get_credential(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyIdParams>,
) -> Result<Json<Envelope<CredentialRow>>, AppError> {
    let credential = state.credentials().get(params.company_id).await?;
    Ok(ok("access token fetched", credential))
}

/// POST /api/v1/access-token — register a credential and fetch the first token.
pub async fn create_credential(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCredentialRequest>,
) -> Result<Json<Envelope<CredentialRow>>, AppError> {
    if payload.app_key.is_empty() || payload.app_secret.is_empty() {
        return Err(AppError::Validation(
            "app_key and app_secret are required".into(),
        ));
    }

    let credential = state
        .credentials()
        .create(payload.company_id, payload.app_key, payload.app_secret)
        .await?;
    Ok(ok("credential created", credential))
}

/// PUT /api/v1/access-token/:id
pub async fn update_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCredentialRequest>,
) -> Result<Json<Envelope<CredentialRow>>, AppError> {
    if payload.app_key.is_empty() || payload.app_secret.is_empty() {
        return Err(AppError::Validation(
            "app_key and app_secret are required".into(),
        ));
    }

    let credential = state
        .credentials()
        .update(
            id,
            CredentialUpdate {
                app_key: payload.app_key,
                app_secret: payload.app_secret,
                status: payload.status,
            },
        )
        .await?;
    Ok(ok("credential updated", credential))
}

/// DELETE /api/v1/access-token/:id
pub async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    state.credentials().delete(id).await?;
    Ok(ok("credential deleted", ()))
}

/// GET /api/v1/access-token/list
pub async fn list_credentials(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Pagination>,
) -> Result<Json<Envelope<PageData<CredentialRow>>>, AppError> {
    let (page, page_size) = (params.page(), params.page_size());
    let (list, total) = state.credentials().list(page, page_size).await?;
    Ok(ok(
        "credential list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/access-token/refresh — force a refresh regardless of expiry.
pub async fn refresh_credential(
    State(state): State<Arc<AppState>>,
    Json(params): Json<CompanyIdParams>,
) -> Result<Json<Envelope<CredentialRow>>, AppError> {
    let credential = state.credentials().refresh(params.company_id).await?;
    Ok(ok("access token refreshed", credential))
}

/// POST /api/v1/access-token/test — probe the token against the upstream.
pub async fn test_credential(
    State(state): State<Arc<AppState>>,
    Json(params): Json<CompanyIdParams>,
) -> Result<Json<Envelope<()>>, AppError> {
    state.credentials().test(params.company_id).await?;
    Ok(ok("access token is valid", ()))
}
