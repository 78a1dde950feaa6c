use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{like, ok, page_bounds, Envelope, PageData};
use crate::auth::fields::FieldPermissionResolver;
use crate::auth::gate::AuthContext;
use crate::auth::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::store::postgres::{
    CompanyRow, DataDictionaryRow, FieldPermissionRow, MenuRow, NewCompany, NewDictionaryEntry,
    NewFieldPermission, NewMenu, NewRole, NewUser, RoleRow, UserRow,
};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct CompanyListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub name: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct UserListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub company_id: Option<i64>,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub company_id: i64,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub company_id: i64,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub status: i16,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRow,
    pub role_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateOwnPasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct AssignRolesRequest {
    pub role_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct AssignMenusRequest {
    pub menu_ids: Vec<i64>,
}

#[derive(Deserialize)]
pub struct RoleListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub name: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct MenuListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub name: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct FieldPermissionListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub role_id: Option<i64>,
    pub module: Option<String>,
    pub field: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateFieldPermissionRequest {
    pub role_id: i64,
    pub module: String,
    pub field: String,
    pub viewable: Option<i16>,
    pub editable: Option<i16>,
    pub report_visible: Option<i16>,
    pub special_edit: Option<i16>,
}

#[derive(Deserialize)]
pub struct DictionaryListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub module: Option<String>,
    pub field: Option<String>,
    pub status: Option<i16>,
}

#[derive(Deserialize)]
pub struct CreateDictionaryRequest {
    pub module: String,
    pub field: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub required: Option<i16>,
    pub editable: Option<i16>,
    #[serde(default = "default_data_type")]
    pub data_type: String,
    #[serde(default)]
    pub max_length: i32,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub default_value: String,
    pub status: Option<i16>,
}

fn default_data_type() -> String {
    "string".into()
}

#[derive(Serialize)]
pub struct CompanyNode {
    #[serde(flatten)]
    pub company: CompanyRow,
    pub children: Vec<CompanyNode>,
}

#[derive(Serialize)]
pub struct MenuNode {
    #[serde(flatten)]
    pub menu: MenuRow,
    pub children: Vec<MenuNode>,
}

// ── Company Handlers ─────────────────────────────────────────

/// GET /api/v1/company — paginated company list
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompanyListParams>,
) -> Result<Json<Envelope<PageData<CompanyRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_companies(page, page_size, like(params.name), params.status)
        .await?;
    Ok(ok(
        "company list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/company — create a company
pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewCompany>,
) -> Result<Json<Envelope<CompanyRow>>, AppError> {
    if payload.name.is_empty() || payload.code.is_empty() {
        return Err(AppError::Validation("name and code are required".into()));
    }
    if payload.status == 0 {
        payload.status = 1;
    }
    if payload.kind == 0 {
        payload.kind = 1;
    }
    if payload.parent_id > 0 && state.db.company(payload.parent_id).await?.is_none() {
        return Err(AppError::NotFound("parent company not found".into()));
    }
    if state.db.company_by_code(&payload.code, None).await?.is_some() {
        return Err(AppError::AlreadyExists("company code already exists".into()));
    }

    let company = state.db.insert_company(&payload).await?;
    Ok(ok("company created", company))
}

/// GET /api/v1/company/:id
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<CompanyRow>>, AppError> {
    let company = state
        .db
        .company(id)
        .await?
        .ok_or_else(|| AppError::NotFound("company not found".into()))?;
    Ok(ok("company fetched", company))
}

/// PUT /api/v1/company/:id
pub async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewCompany>,
) -> Result<Json<Envelope<CompanyRow>>, AppError> {
    let mut company = state
        .db
        .company(id)
        .await?
        .ok_or_else(|| AppError::NotFound("company not found".into()))?;

    if payload.parent_id > 0 && state.db.company(payload.parent_id).await?.is_none() {
        return Err(AppError::NotFound("parent company not found".into()));
    }
    if state
        .db
        .company_by_code(&payload.code, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("company code already exists".into()));
    }

    company.parent_id = payload.parent_id;
    company.name = payload.name;
    company.code = payload.code;
    company.kind = payload.kind;
    company.status = payload.status;
    state.db.save_company(&company).await?;

    Ok(ok("company updated", company))
}

/// DELETE /api/v1/company/:id
pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_company(id).await? {
        return Err(AppError::NotFound("company not found".into()));
    }
    Ok(ok("company deleted", ()))
}

/// GET /api/v1/company/tree — parent/child hierarchy rooted at HQ
pub async fn company_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<CompanyNode>>>, AppError> {
    let companies = state.db.all_companies().await?;
    Ok(ok("company tree fetched", build_company_tree(&companies, 0)))
}

fn build_company_tree(rows: &[CompanyRow], parent_id: i64) -> Vec<CompanyNode> {
    rows.iter()
        .filter(|c| c.parent_id == parent_id)
        .map(|c| CompanyNode {
            company: c.clone(),
            children: build_company_tree(rows, c.id),
        })
        .collect()
}

// ── User Handlers ────────────────────────────────────────────

/// GET /api/v1/user — paginated user list
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Envelope<PageData<UserRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_users(
            page,
            page_size,
            params.company_id,
            like(params.username),
            like(params.nickname),
            params.status,
        )
        .await?;
    Ok(ok(
        "user list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/user — create a user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<Envelope<UserRow>>, AppError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".into(),
        ));
    }
    state
        .db
        .company(payload.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company not found".into()))?;
    if state
        .db
        .user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("username already exists".into()));
    }

    let user = state
        .db
        .insert_user(&NewUser {
            company_id: payload.company_id,
            username: payload.username,
            password: hash_password(&payload.password)?,
            nickname: payload.nickname,
            email: payload.email,
            phone: payload.phone,
            status: payload.status.unwrap_or(1),
        })
        .await?;

    Ok(ok("user created", user))
}

/// GET /api/v1/user/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<UserRow>>, AppError> {
    let user = state
        .db
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    Ok(ok("user fetched", user))
}

/// PUT /api/v1/user/:id — update profile fields.
/// Each changed field is checked against the caller's field-level edit
/// permission for module `user` before anything is written.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Envelope<UserRow>>, AppError> {
    let mut user = state
        .db
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    state
        .db
        .company(payload.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("company not found".into()))?;

    let resolver = FieldPermissionResolver::new(&state.db);
    let changes = [
        ("company_id", payload.company_id != user.company_id),
        ("nickname", payload.nickname != user.nickname),
        ("email", payload.email != user.email),
        ("phone", payload.phone != user.phone),
        ("status", payload.status != user.status),
    ];
    for (field, changed) in changes {
        if changed && !resolver.check_field_editable(auth.user_id, "user", field).await? {
            return Err(AppError::Forbidden(format!(
                "field '{field}' is not editable"
            )));
        }
    }

    user.company_id = payload.company_id;
    user.nickname = payload.nickname;
    user.email = payload.email;
    user.phone = payload.phone;
    user.status = payload.status;
    state.db.save_user(&user).await?;

    Ok(ok("user updated", user))
}

/// DELETE /api/v1/user/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_user(id).await? {
        return Err(AppError::NotFound("user not found".into()));
    }
    Ok(ok("user deleted", ()))
}

/// PUT /api/v1/user/:id/reset-password — administrative reset.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    if payload.password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    let resolver = FieldPermissionResolver::new(&state.db);
    if !resolver
        .check_field_editable(auth.user_id, "user", "password")
        .await?
    {
        return Err(AppError::Forbidden("field 'password' is not editable".into()));
    }

    let hash = hash_password(&payload.password)?;
    if !state.db.set_user_password(id, &hash).await? {
        return Err(AppError::NotFound("user not found".into()));
    }
    Ok(ok("password reset", ()))
}

/// PUT /api/v1/user/update-password — self-service change.
pub async fn update_own_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateOwnPasswordRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    if payload.new_password.is_empty() {
        return Err(AppError::Validation("new password is required".into()));
    }

    let user = state
        .db
        .user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    if !verify_password(&payload.old_password, &user.password) {
        return Err(AppError::Validation("old password is incorrect".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    state.db.set_user_password(user.id, &hash).await?;
    Ok(ok("password updated", ()))
}

/// POST /api/v1/user/login — public.
/// The failure message never reveals whether the username exists, the account
/// is disabled, or the password mismatched.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginResponse>>, AppError> {
    let denied = || AppError::Unauthenticated("invalid username or password".into());

    let user = state
        .db
        .user_by_username(&payload.username)
        .await?
        .ok_or_else(denied)?;

    if user.status != 1 || !verify_password(&payload.password, &user.password) {
        return Err(denied());
    }

    let role_ids = state.db.user_role_ids(user.id).await?;
    let token = state
        .signer
        .issue(user.id, &user.username, role_ids.clone())?;

    tracing::info!(username = %user.username, "login succeeded");
    Ok(ok(
        "login successful",
        LoginResponse {
            token,
            user,
            role_ids,
        },
    ))
}

/// GET /api/v1/user/:id/roles
pub async fn get_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<Vec<RoleRow>>>, AppError> {
    state
        .db
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;
    let roles = state.db.roles_for_user(id).await?;
    Ok(ok("user roles fetched", roles))
}

/// PUT /api/v1/user/:id/assign-roles — replace the user's role set.
pub async fn assign_user_roles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRolesRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    state
        .db
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    let mut role_ids = payload.role_ids;
    role_ids.sort_unstable();
    role_ids.dedup();

    let known = state.db.roles_by_ids(&role_ids).await?;
    if known.len() != role_ids.len() {
        return Err(AppError::Validation("one or more roles do not exist".into()));
    }

    state.db.assign_user_roles(id, &role_ids).await?;
    Ok(ok("roles assigned", ()))
}

// ── Role Handlers ────────────────────────────────────────────

/// GET /api/v1/role
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RoleListParams>,
) -> Result<Json<Envelope<PageData<RoleRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_roles(page, page_size, like(params.name), params.status)
        .await?;
    Ok(ok(
        "role list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/role
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewRole>,
) -> Result<Json<Envelope<RoleRow>>, AppError> {
    if payload.name.is_empty() || payload.code.is_empty() {
        return Err(AppError::Validation("name and code are required".into()));
    }
    if payload.status == 0 {
        payload.status = 1;
    }
    if state.db.role_by_code(&payload.code, None).await?.is_some() {
        return Err(AppError::AlreadyExists("role code already exists".into()));
    }

    let role = state.db.insert_role(&payload).await?;
    Ok(ok("role created", role))
}

/// GET /api/v1/role/:id
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<RoleRow>>, AppError> {
    let role = state
        .db
        .role(id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;
    Ok(ok("role fetched", role))
}

/// PUT /api/v1/role/:id
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewRole>,
) -> Result<Json<Envelope<RoleRow>>, AppError> {
    let mut role = state
        .db
        .role(id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;

    if state
        .db
        .role_by_code(&payload.code, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists("role code already exists".into()));
    }

    role.name = payload.name;
    role.code = payload.code;
    role.status = payload.status;
    state.db.save_role(&role).await?;

    Ok(ok("role updated", role))
}

/// DELETE /api/v1/role/:id
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_role(id).await? {
        return Err(AppError::NotFound("role not found".into()));
    }
    Ok(ok("role deleted", ()))
}

/// GET /api/v1/role/:id/menus
pub async fn get_role_menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<Vec<MenuRow>>>, AppError> {
    state
        .db
        .role(id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;
    let menus = state.db.menus_for_role(id).await?;
    Ok(ok("role menus fetched", menus))
}

/// PUT /api/v1/role/:id/assign-menus — replace the role's menu set.
pub async fn assign_role_menus(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignMenusRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    state
        .db
        .role(id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;

    let mut menu_ids = payload.menu_ids;
    menu_ids.sort_unstable();
    menu_ids.dedup();

    state.db.assign_role_menus(id, &menu_ids).await?;
    Ok(ok("menus assigned", ()))
}

// ── Menu Handlers ────────────────────────────────────────────

/// GET /api/v1/menu
pub async fn list_menus(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MenuListParams>,
) -> Result<Json<Envelope<PageData<MenuRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_menus(page, page_size, like(params.name), params.status)
        .await?;
    Ok(ok(
        "menu list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/menu
pub async fn create_menu(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<NewMenu>,
) -> Result<Json<Envelope<MenuRow>>, AppError> {
    if payload.name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if payload.status == 0 {
        payload.status = 1;
    }
    if payload.kind == 0 {
        payload.kind = 1;
    }
    if payload.parent_id > 0 && state.db.menu(payload.parent_id).await?.is_none() {
        return Err(AppError::NotFound("parent menu not found".into()));
    }

    let menu = state.db.insert_menu(&payload).await?;
    Ok(ok("menu created", menu))
}

/// GET /api/v1/menu/:id
pub async fn get_menu(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<MenuRow>>, AppError> {
    let menu = state
        .db
        .menu(id)
        .await?
        .ok_or_else(|| AppError::NotFound("menu not found".into()))?;
    Ok(ok("menu fetched", menu))
}

/// PUT /api/v1/menu/:id
pub async fn update_menu(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<NewMenu>,
) -> Result<Json<Envelope<MenuRow>>, AppError> {
    let mut menu = state
        .db
        .menu(id)
        .await?
        .ok_or_else(|| AppError::NotFound("menu not found".into()))?;

    if payload.parent_id > 0 && state.db.menu(payload.parent_id).await?.is_none() {
        return Err(AppError::NotFound("parent menu not found".into()));
    }

    menu.parent_id = payload.parent_id;
    menu.name = payload.name;
    menu.path = payload.path;
    menu.component = payload.component;
    menu.icon = payload.icon;
    menu.sort = payload.sort;
    menu.kind = payload.kind;
    menu.status = payload.status;
    state.db.save_menu(&menu).await?;

    Ok(ok("menu updated", menu))
}

/// DELETE /api/v1/menu/:id
pub async fn delete_menu(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_menu(id).await? {
        return Err(AppError::NotFound("menu not found".into()));
    }
    Ok(ok("menu deleted", ()))
}

/// GET /api/v1/menu/tree — full hierarchy, ordered by sort.
pub async fn menu_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<MenuNode>>>, AppError> {
    let menus = state.db.all_menus().await?;
    Ok(ok("menu tree fetched", build_menu_tree(&menus, 0)))
}

/// GET /api/v1/menu/all
pub async fn all_menus(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<MenuRow>>>, AppError> {
    let menus = state.db.all_menus().await?;
    Ok(ok("menus fetched", menus))
}

/// GET /api/v1/menu/parent/:parent_id
pub async fn menus_by_parent(
    State(state): State<Arc<AppState>>,
    Path(parent_id): Path<i64>,
) -> Result<Json<Envelope<Vec<MenuRow>>>, AppError> {
    let menus = state.db.menus_by_parent(parent_id).await?;
    Ok(ok("menus fetched", menus))
}

fn build_menu_tree(rows: &[MenuRow], parent_id: i64) -> Vec<MenuNode> {
    rows.iter()
        .filter(|m| m.parent_id == parent_id)
        .map(|m| MenuNode {
            menu: m.clone(),
            children: build_menu_tree(rows, m.id),
        })
        .collect()
}

// ── Field Permission Handlers ────────────────────────────────

/// GET /api/v1/field-permission
pub async fn list_field_permissions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FieldPermissionListParams>,
) -> Result<Json<Envelope<PageData<FieldPermissionRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_field_permissions(
            page,
            page_size,
            params.role_id,
            params.module.filter(|m| !m.is_empty()),
            like(params.field),
        )
        .await?;
    Ok(ok(
        "field permission list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/field-permission
pub async fn create_field_permission(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateFieldPermissionRequest>,
) -> Result<Json<Envelope<FieldPermissionRow>>, AppError> {
    if payload.module.is_empty() || payload.field.is_empty() {
        return Err(AppError::Validation("module and field are required".into()));
    }
    state
        .db
        .role(payload.role_id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;
    if state
        .db
        .find_field_permission(payload.role_id, &payload.module, &payload.field, None)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "a permission for this role and field already exists".into(),
        ));
    }

    let permission = state
        .db
        .insert_field_permission(&NewFieldPermission {
            role_id: payload.role_id,
            module: payload.module,
            field: payload.field,
            viewable: payload.viewable.unwrap_or(1),
            editable: payload.editable.unwrap_or(1),
            report_visible: payload.report_visible.unwrap_or(1),
            special_edit: payload.special_edit.unwrap_or(0),
        })
        .await?;

    Ok(ok("field permission created", permission))
}

/// GET /api/v1/field-permission/:id
pub async fn get_field_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<FieldPermissionRow>>, AppError> {
    let permission = state
        .db
        .field_permission(id)
        .await?
        .ok_or_else(|| AppError::NotFound("field permission not found".into()))?;
    Ok(ok("field permission fetched", permission))
}

/// PUT /api/v1/field-permission/:id
pub async fn update_field_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateFieldPermissionRequest>,
) -> Result<Json<Envelope<FieldPermissionRow>>, AppError> {
    let mut permission = state
        .db
        .field_permission(id)
        .await?
        .ok_or_else(|| AppError::NotFound("field permission not found".into()))?;
    state
        .db
        .role(payload.role_id)
        .await?
        .ok_or_else(|| AppError::NotFound("role not found".into()))?;
    if state
        .db
        .find_field_permission(payload.role_id, &payload.module, &payload.field, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "a permission for this role and field already exists".into(),
        ));
    }

    permission.role_id = payload.role_id;
    permission.module = payload.module;
    permission.field = payload.field;
    permission.viewable = payload.viewable.unwrap_or(permission.viewable);
    permission.editable = payload.editable.unwrap_or(permission.editable);
    permission.report_visible = payload.report_visible.unwrap_or(permission.report_visible);
    permission.special_edit = payload.special_edit.unwrap_or(permission.special_edit);
    state.db.save_field_permission(&permission).await?;

    Ok(ok("field permission updated", permission))
}

/// DELETE /api/v1/field-permission/:id
pub async fn delete_field_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_field_permission(id).await? {
        return Err(AppError::NotFound("field permission not found".into()));
    }
    Ok(ok("field permission deleted", ()))
}

/// GET /api/v1/field-permission/role/:role_id/module/:module
pub async fn field_permissions_by_role_module(
    State(state): State<Arc<AppState>>,
    Path((role_id, module)): Path<(i64, String)>,
) -> Result<Json<Envelope<Vec<FieldPermissionRow>>>, AppError> {
    let permissions = state
        .db
        .field_permissions_by_role_module(role_id, &module)
        .await?;
    Ok(ok("field permissions fetched", permissions))
}

// ── Data Dictionary Handlers ─────────────────────────────────

/// GET /api/v1/data-dictionary
pub async fn list_dictionary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DictionaryListParams>,
) -> Result<Json<Envelope<PageData<DataDictionaryRow>>>, AppError> {
    let (page, page_size) = page_bounds(params.page, params.page_size);
    let (list, total) = state
        .db
        .list_dictionary(
            page,
            page_size,
            params.module.filter(|m| !m.is_empty()),
            like(params.field),
            params.status,
        )
        .await?;
    Ok(ok(
        "dictionary list fetched",
        PageData {
            list,
            total,
            page,
            page_size,
        },
    ))
}

/// POST /api/v1/data-dictionary
pub async fn create_dictionary_entry(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDictionaryRequest>,
) -> Result<Json<Envelope<DataDictionaryRow>>, AppError> {
    if payload.module.is_empty() || payload.field.is_empty() || payload.label.is_empty() {
        return Err(AppError::Validation(
            "module, field and label are required".into(),
        ));
    }
    if state
        .db
        .dictionary_by_module_field(&payload.module, &payload.field, None)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "a dictionary entry for this field already exists".into(),
        ));
    }

    let entry = state
        .db
        .insert_dictionary_entry(&NewDictionaryEntry {
            module: payload.module,
            field: payload.field,
            label: payload.label,
            description: payload.description,
            required: payload.required.unwrap_or(0),
            editable: payload.editable.unwrap_or(1),
            data_type: payload.data_type,
            max_length: payload.max_length,
            options: payload.options,
            default_value: payload.default_value,
            status: payload.status.unwrap_or(1),
        })
        .await?;

    Ok(ok("dictionary entry created", entry))
}

/// GET /api/v1/data-dictionary/:id
pub async fn get_dictionary_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<DataDictionaryRow>>, AppError> {
    let entry = state
        .db
        .dictionary_entry_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("dictionary entry not found".into()))?;
    Ok(ok("dictionary entry fetched", entry))
}

/// PUT /api/v1/data-dictionary/:id
pub async fn update_dictionary_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateDictionaryRequest>,
) -> Result<Json<Envelope<DataDictionaryRow>>, AppError> {
    let mut entry = state
        .db
        .dictionary_entry_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("dictionary entry not found".into()))?;
    if state
        .db
        .dictionary_by_module_field(&payload.module, &payload.field, Some(id))
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "a dictionary entry for this field already exists".into(),
        ));
    }

    entry.module = payload.module;
    entry.field = payload.field;
    entry.label = payload.label;
    entry.description = payload.description;
    entry.required = payload.required.unwrap_or(entry.required);
    entry.editable = payload.editable.unwrap_or(entry.editable);
    entry.data_type = payload.data_type;
    entry.max_length = payload.max_length;
    entry.options = payload.options;
    entry.default_value = payload.default_value;
    entry.status = payload.status.unwrap_or(entry.status);
    state.db.save_dictionary_entry(&entry).await?;

    Ok(ok("dictionary entry updated", entry))
}

/// DELETE /api/v1/data-dictionary/:id
pub async fn delete_dictionary_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    if !state.db.soft_delete_dictionary_entry(id).await? {
        return Err(AppError::NotFound("dictionary entry not found".into()));
    }
    Ok(ok("dictionary entry deleted", ()))
}

/// GET /api/v1/data-dictionary/module/:module
pub async fn dictionary_by_module(
    State(state): State<Arc<AppState>>,
    Path(module): Path<String>,
) -> Result<Json<Envelope<Vec<DataDictionaryRow>>>, AppError> {
    let entries = state.db.dictionary_by_module(&module).await?;
    Ok(ok("dictionary entries fetched", entries))
}

/// GET /api/v1/data-dictionary/module/:module/field/:field
pub async fn dictionary_by_module_field(
    State(state): State<Arc<AppState>>,
    Path((module, field)): Path<(String, String)>,
) -> Result<Json<Envelope<DataDictionaryRow>>, AppError> {
    let entry = state
        .db
        .dictionary_by_module_field(&module, &field, None)
        .await?
        .ok_or_else(|| AppError::NotFound("dictionary entry not found".into()))?;
    Ok(ok("dictionary entry fetched", entry))
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn company(id: i64, parent_id: i64) -> CompanyRow {
        CompanyRow {
            id,
            parent_id,
            name: format!("company-{id}"),
            code: format!("C{id}"),
            kind: if parent_id == 0 { 1 } else { 2 },
            status: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn menu(id: i64, parent_id: i64, sort: i32) -> MenuRow {
        MenuRow {
            id,
            parent_id,
            name: format!("menu-{id}"),
            path: String::new(),
            component: String::new(),
            icon: String::new(),
            sort,
            kind: 1,
            status: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_company_tree_nests_children() {
        let rows = vec![company(1, 0), company(2, 1), company(3, 1), company(4, 2)];
        let tree = build_company_tree(&rows, 0);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].company.id, 1);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].company.id, 4);
    }

    #[test]
    fn test_company_tree_multiple_roots() {
        let rows = vec![company(1, 0), company(2, 0)];
        let tree = build_company_tree(&rows, 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_orphaned_company_excluded_from_tree() {
        // parent 99 does not exist — the node is unreachable from the root
        let rows = vec![company(1, 0), company(2, 99)];
        let tree = build_company_tree(&rows, 0);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_menu_tree_preserves_sort_order() {
        // all_menus returns rows ordered by sort; the tree must keep it
        let rows = vec![menu(1, 0, 0), menu(3, 1, 1), menu(2, 1, 2)];
        let tree = build_menu_tree(&rows, 0);
        assert_eq!(tree[0].children[0].menu.id, 3);
        assert_eq!(tree[0].children[1].menu.id, 2);
    }
}
