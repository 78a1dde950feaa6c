use std::sync::Arc;

use axum::{
    extract::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::gate::{self, Capability};
use crate::AppState;

pub mod apitest;
pub mod credentials;
pub mod handlers;

/// Uniform response envelope: `{"code": 200, "message": ..., "data": ...}`.
/// Errors produce the same shape through `AppError::into_response`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        code: 200,
        message: message.to_string(),
        data: Some(data),
    })
}

/// Envelope payload for list endpoints.
#[derive(Debug, Serialize)]
pub struct PageData<T: Serialize> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Common `?page=&page_size=` query params.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(10).clamp(1, 200)
    }
}

/// Clamped (page, page_size) for list params that carry their own filter
/// fields. Kept separate from `Pagination` because `serde(flatten)` does not
/// mix with `Query`'s urlencoded deserializer for numeric fields.
pub(crate) fn page_bounds(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    (page.unwrap_or(1).max(1), page_size.unwrap_or(10).clamp(1, 200))
}

/// Wrap fuzzy-match filters for the store's LIKE binds.
pub(crate) fn like(value: Option<String>) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| format!("%{v}%"))
}

/// Build the /api/v1 router. Every group sits behind `authenticate`; all but
/// the self-service user routes additionally require the group capability.
pub fn api_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .nest(
            "/company",
            guarded(company_routes(), state, "company:manage"),
        )
        .nest("/user", user_routes(state))
        .nest("/role", guarded(role_routes(), state, "role:manage"))
        .nest("/menu", guarded(menu_routes(), state, "menu:manage"))
        .nest(
            "/field-permission",
            guarded(field_permission_routes(), state, "permission:manage"),
        )
        .nest(
            "/data-dictionary",
            guarded(dictionary_routes(), state, "dictionary:manage"),
        )
        .nest(
            "/access-token",
            guarded(credential_routes(), state, "credential:manage"),
        )
        .nest(
            "/api-config",
            guarded(api_config_routes(), state, "apitest:manage"),
        )
        .nest(
            "/api-test",
            guarded(api_test_routes(), state, "apitest:manage"),
        )
        .fallback(fallback_404)
}

/// Authentication + capability gate for a route group. Layer order matters:
/// authenticate must run first, then the Capability extension must be present
/// before the gate reads it.
fn guarded(
    routes: Router<Arc<AppState>>,
    state: &Arc<AppState>,
    capability: &'static str,
) -> Router<Arc<AppState>> {
    routes
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::capability_gate,
        ))
        .route_layer(Extension(Capability(capability)))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ))
}

fn company_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route("/tree", get(handlers::company_tree))
        .route(
            "/:id",
            get(handlers::get_company)
                .put(handlers::update_company)
                .delete(handlers::delete_company),
        )
}

/// The user group mixes three protection levels: public login,
/// authenticated-only self-service, and capability-gated management.
fn user_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let managed = guarded(
        Router::new()
            .route("/", get(handlers::list_users).post(handlers::create_user))
            .route(
                "/:id",
                get(handlers::get_user)
                    .put(handlers::update_user)
                    .delete(handlers::delete_user),
            )
            .route("/:id/reset-password", put(handlers::reset_password))
            .route("/:id/roles", get(handlers::get_user_roles))
            .route("/:id/assign-roles", put(handlers::assign_user_roles)),
        state,
        "user:manage",
    );

    let self_service = Router::new()
        .route("/update-password", put(handlers::update_own_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ));

    managed
        .merge(self_service)
        .route("/login", post(handlers::login))
}

fn role_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_roles).post(handlers::create_role))
        .route(
            "/:id",
            get(handlers::get_role)
                .put(handlers::update_role)
                .delete(handlers::delete_role),
        )
        .route("/:id/menus", get(handlers::get_role_menus))
        .route("/:id/assign-menus", put(handlers::assign_role_menus))
}

fn menu_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_menus).post(handlers::create_menu))
        .route("/tree", get(handlers::menu_tree))
        .route("/all", get(handlers::all_menus))
        .route("/parent/:parent_id", get(handlers::menus_by_parent))
        .route(
            "/:id",
            get(handlers::get_menu)
                .put(handlers::update_menu)
                .delete(handlers::delete_menu),
        )
}

fn field_permission_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_field_permissions).post(handlers::create_field_permission),
        )
        .route(
            "/:id",
            get(handlers::get_field_permission)
                .put(handlers::update_field_permission)
                .delete(handlers::delete_field_permission),
        )
        .route(
            "/role/:role_id/module/:module",
            get(handlers::field_permissions_by_role_module),
        )
}

fn dictionary_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_dictionary).post(handlers::create_dictionary_entry),
        )
        .route(
            "/:id",
            get(handlers::get_dictionary_entry)
                .put(handlers::update_dictionary_entry)
                .delete(handlers::delete_dictionary_entry),
        )
        .route("/module/:module", get(handlers::dictionary_by_module))
        .route(
            "/module/:module/field/:field",
            get(handlers::dictionary_by_module_field),
        )
}

fn credential_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(credentials::get_credential).post(credentials::create_credential),
        )
        .route("/list", get(credentials::list_credentials))
        .route("/refresh", post(credentials::refresh_credential))
        .route("/test", post(credentials::test_credential))
        .route(
            "/:id",
            put(credentials::update_credential).delete(credentials::delete_credential),
        )
}

fn api_config_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(apitest::list_api_configs).post(apitest::create_api_config),
        )
        .route(
            "/:id",
            get(apitest::get_api_config)
                .put(apitest::update_api_config)
                .delete(apitest::delete_api_config),
        )
}

fn api_test_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/case",
            get(apitest::list_test_cases).post(apitest::create_test_case),
        )
        .route(
            "/case/:id",
            get(apitest::get_test_case)
                .put(apitest::update_test_case)
                .delete(apitest::delete_test_case),
        )
        .route("/run/:case_id", post(apitest::run_test_case))
        .route("/history", get(apitest::list_test_history))
}

async fn fallback_404(_req: Request) -> Response {
    crate::errors::AppError::NotFound("resource not found".into()).into_response()
}
