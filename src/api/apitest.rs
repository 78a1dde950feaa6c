//! Outbound API test tool: configured endpoints, reusable test cases, a
//! runner that executes a case against the real endpoint, and an execution
//! history.
//!
//! The runner is a thin pass-through client: case headers/params are merged
//! over the config's (case wins), GET/DELETE params go to the query string,
//! anything else is sent as a JSON body. Every run — including transport
//! failures — is recorded as a history row.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::{like, ok, page_bounds, Envelope, PageData};
use crate::auth::gate::AuthContext;
use crate::errors::AppError;
use crate::store::postgres::{
    ApiConfigRow, ApiTestCaseRow, ApiTestHistoryRow, NewApiConfig, NewApiTestCase, NewTestHistory,
};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct ApiConfigListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub company_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct CreateApiConfigRequest {
    pub company_id: i64,
    pub name: String,
    pub code: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub kind: Option<i16>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<i16>,
}

fn default_version() -> String {
    "v1".into()
}

fn default_method() -> String {
    "GET".into()
}

#[derive(Deserialize)]
pub struct TestCaseListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub company_id: Option<i64>,
    pub api_config_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct CreateTestCaseRequest {
    pub company_id: i64,
    pub api_config_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub expected_result: String,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct HistoryListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub company_id: Option<i64>,
    pub api_config_id: Option<i64>,
    pub user_id: Option<i64>,
}

// ── API Config Handlers ──────────────────────────────────────

/// GET /api/v1/api-config
pub async fn list_api_configs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiConfigListParams>,
) -> Result<Json<Envelope<PageData<ApiConfigRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_api_configs(
            page,
            page_size,
            params.company_id,
            like(params.name),
            params.status,
        )
        .await?;
    Ok(ok(
        "api config list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/api-config
pub async fn create_api_config(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateApiConfigRequest>,
) -> Result<Json<Envelope<ApiConfigRow>>, AppError> {
    if payload.name.is_empty() || payload.code.is_empty() {
        return Err(AppError::Validation("name and code are required".into()));
    }
    state
        .db
        .company(payload.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company not found".into()))?;
    if state
        .db
        .api_config_by_code(&payload.code, None)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("api config code already exists".into()));
    }

    let config = state
        .db
        .insert_api_config(&NewApiConfig {
            company_id: payload.company_id,
            name: payload.name,
            code: payload.code,
            version: payload.version,
            kind: payload.kind.unwrap_or(1),
            base_url: payload.base_url,
            path: payload.path,
            method: payload.method.to_uppercase(),
            params: payload.params,
            headers: payload.headers,
            description: payload.description,
            status: payload.status.unwrap_or(1),
        })
        .await?;

    Ok(ok("api config created", config))
}

/// GET /api/v1/api-config/:id
pub async fn get_api_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<ApiConfigRow>>, AppError> {
    let config = state
        .db
        .api_config(id)
        .await?
        .ok_or_else(|| AppError::NotFound("api config not found".into()))?;
    Ok(ok("api config fetched", config))
}

/// PUT /api/v1/api-config/:id
pub async fn update_api_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateApiConfigRequest>,
) -> Result<Json<Envelope<ApiConfigRow>>, AppError> {
    let mut config = state
        .db
        .api_config(id)
        .await?
        .ok_or_else(|| AppError::NotFound("api config not found".into()))?;
    if state
        .db
        .api_config_by_code(&payload.code, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("api config code already exists".into()));
    }

    config.company_id = payload.company_id;
    config.name = payload.name;
    config.code = payload.code;
    config.version = payload.version;
    config.kind = payload.kind.unwrap_or(config.kind);
    config.base_url = payload.base_url;
    config.path = payload.path;
    config.method = payload.method.to_uppercase();
    config.params = payload.params;
    config.headers = payload.headers;
    config.description = payload.description;
    config.status = payload.status.unwrap_or(config.status);
    state.db.save_api_config(&config).await?;

    Ok(ok("api config updated", config))
}

/// DELETE /api/v1/api-config/:id
pub async fn delete_api_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_api_config(id).await? {
        return Err(AppError::NotFound("api config not found".into()));
    }
    Ok(ok("api config deleted", ()))
}

// ── Test Case Handlers ───────────────────────────────────────

/// GET /api/v1/api-test/case
pub async fn list_test_cases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TestCaseListParams>,
) -> Result<Json<Envelope<PageData<ApiTestCaseRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_test_cases(
            page,
            page_size,
            params.company_id,
            params.api_config_id,
            like(params.name),
            params.status,
        )
        .await?;
    Ok(ok(
        "test case list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/api-test/case
pub async fn create_test_case(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTestCaseRequest>,
) -> Result<Json<Envelope<ApiTestCaseRow>>, AppError> {
    if payload.name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    state
        .db
        .api_config(payload.api_config_id)
        .await?
        .ok_or_else(|| AppError::NotFound("api config not found".into()))?;

    let case = state
        .db
        .insert_test_case(&NewApiTestCase {
            company_id: payload.company_id,
            api_config_id: payload.api_config_id,
            name: payload.name,
            description: payload.description,
            params: payload.params,
            headers: payload.headers,
            expected_result: payload.expected_result,
            status: payload.status.unwrap_or(1),
        })
        .await?;

    Ok(ok("test case created", case))
}

/// GET /api/v1/api-test/case/:id
pub async fn get_test_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<ApiTestCaseRow>>, AppError> {
    let case = state
        .db
        .test_case(id)
        .await?
        .ok_or_else(|| AppError::NotFound("test case not found".into()))?;
    Ok(ok("test case fetched", case))
}

/// PUT /api/v1/api-test/case/:id
pub async fn update_test_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateTestCaseRequest>,
) -> Result<Json<Envelope<ApiTestCaseRow>>, AppError> {
    let mut case = state
        .db
        .test_case(id)
        .await?
        .ok_or_else(|| AppError::NotFound("test case not found".into()))?;
    state
        .db
        .api_config(payload.api_config_id)
        .await?
        .ok_or_else(|| AppError::NotFound("api config not found".into()))?;

    case.company_id = payload.company_id;
    case.api_config_id = payload.api_config_id;
    case.name = payload.name;
    case.description = payload.description;
    case.params = payload.params;
    case.headers = payload.headers;
    case.expected_result = payload.expected_result;
    case.status = payload.status.unwrap_or(case.status);
    state.db.save_test_case(&case).await?;

    Ok(ok("test case updated", case))
}

/// DELETE /api/v1/api-test/case/:id
pub async fn delete_test_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_test_case(id).await? {
        return Err(AppError::NotFound("test case not found".into()));
    }
    Ok(ok("test case deleted", ()))
}

// ── Runner ───────────────────────────────────────────────────

/// POST /api/v1/api-test/run/:case_id — execute a case and record history.
pub async fn run_test_case(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(case_id): Path<i64>,
) -> Result<Json<Envelope<ApiTestHistoryRow>>, AppError> {
    let case = state
        .db
        .test_case(case_id)
        .await?
        .ok_or_else(|| AppError::NotFound("test case not found".into()))?;
    let config = state
        .db
        .api_config(case.api_config_id)
        .await?
        .ok_or_else(|| AppError::NotFound("api config not found".into()))?;

    let headers = merge_json_objects(&config.headers, &case.headers);
    let params = merge_json_objects(&config.params, &case.params);

    let method = if config.method.is_empty() {
        "GET".to_string()
    } else {
        config.method.to_uppercase()
    };
    let mut url = join_url(&config.base_url, &config.path);

    let send_in_query = method == "GET" || method == "DELETE";
    if send_in_query && !params.is_empty() {
        let sep = if url.contains('?') { '&' } else { '?' };
        url = format!("{url}{sep}{}", query_string(&params));
    }

    let mut request = state
        .http
        .request(
            method.parse().unwrap_or(reqwest::Method::GET),
            &url,
        );
    for (key, value) in &headers {
        if let Some(v) = value.as_str() {
            request = request.header(key.as_str(), v);
        }
    }
    if !send_in_query {
        request = request.json(&Value::Object(params.clone()));
    }

    let started = Instant::now();
    let outcome = request.send().await;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    let mut history = NewTestHistory {
        company_id: case.company_id,
        user_id: auth.user_id,
        api_config_id: case.api_config_id,
        test_case_id: case.id,
        name: case.name.clone(),
        params: case.params.clone(),
        headers: case.headers.clone(),
        actual_result: String::new(),
        status: "failed".into(),
        response_time_ms: elapsed_ms,
        status_code: 0,
        error_message: String::new(),
    };

    match outcome {
        Ok(response) => {
            let status_code = response.status().as_u16();
            history.status_code = status_code as i32;
            history.actual_result = response.text().await.unwrap_or_default();
            if (200..300).contains(&status_code) {
                history.status = "success".into();
            } else {
                history.error_message = format!("HTTP status {status_code}");
            }
        }
        Err(e) => {
            history.error_message = e.to_string();
        }
    }

    let recorded = state.db.insert_test_history(&history).await?;
    Ok(ok("test executed", recorded))
}

/// GET /api/v1/api-test/history
pub async fn list_test_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryListParams>,
) -> Result<Json<Envelope<PageData<ApiTestHistoryRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_test_history(
            page,
            page_size,
            params.company_id,
            params.api_config_id,
            params.user_id,
        )
        .await?;
    Ok(ok(
        "test history fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

// ── Merge / URL helpers ──────────────────────────────────────

/// Parse a stored JSON-object text column; blank or malformed text is an
/// empty object so a broken config degrades instead of failing the run.
fn parse_json_object(text: &str) -> Map<String, Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

/// Merge the case's object over the config's: case entries win.
fn merge_json_objects(config_text: &str, case_text: &str) -> Map<String, Value> {
    let mut merged = parse_json_object(config_text);
    for (key, value) in parse_json_object(case_text) {
        merged.insert(key, value);
    }
    merged
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn query_string(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_entries_override_config() {
        let merged = merge_json_objects(
            r#"{"token":"from-config","page":"1"}"#,
            r#"{"token":"from-case"}"#,
        );
        assert_eq!(merged["token"], json!("from-case"));
        assert_eq!(merged["page"], json!("1"));
    }

    #[test]
    fn test_blank_and_malformed_text_is_empty() {
        assert!(parse_json_object("").is_empty());
        assert!(parse_json_object("not json").is_empty());
        assert!(parse_json_object(r#"["array","not","object"]"#).is_empty());
    }

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "/v2/user"),
            "https://api.example.com/v2/user"
        );
        assert_eq!(
            join_url("https://api.example.com", "v2/user"),
            "https://api.example.com/v2/user"
        );
    }

    #[test]
    fn test_query_string_renders_scalars() {
        let mut params = Map::new();
        params.insert("name".into(), json!("alice"));
        params.insert("limit".into(), json!(10));
        let qs = query_string(&params);
        assert!(qs.contains("name=alice"));
        assert!(qs.contains("limit=10"));
        assert_eq!(qs.matches('&').count(), 1);
    }
}
