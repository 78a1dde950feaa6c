use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- Company Operations --

    pub async fn insert_company(&self, company: &NewCompany) -> anyhow::Result<CompanyRow> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r#"INSERT INTO companies (parent_id, name, code, kind, status)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, parent_id, name, code, kind, status, created_at, updated_at"#,
        )
        .bind(company.parent_id)
        .bind(&company.name)
        .bind(&company.code)
        .bind(company.kind)
        .bind(company.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn company(&self, id: i64) -> anyhow::Result<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, parent_id, name, code, kind, status, created_at, updated_at
             FROM companies WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn company_by_code(
        &self,
        code: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<CompanyRow>> {
        let row = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, parent_id, name, code, kind, status, created_at, updated_at
             FROM companies
             WHERE code = $1 AND deleted_at IS NULL AND ($2::bigint IS NULL OR id != $2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_companies(
        &self,
        page: i64,
        page_size: i64,
        name_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<CompanyRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM companies
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)",
        )
        .bind(&name_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, parent_id, name, code, kind, status, created_at, updated_at
             FROM companies
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(&name_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn all_companies(&self) -> anyhow::Result<Vec<CompanyRow>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            "SELECT id, parent_id, name, code, kind, status, created_at, updated_at
             FROM companies WHERE deleted_at IS NULL ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn save_company(&self, company: &CompanyRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE companies
             SET parent_id = $1, name = $2, code = $3, kind = $4, status = $5, updated_at = NOW()
             WHERE id = $6 AND deleted_at IS NULL",
        )
        .bind(company.parent_id)
        .bind(&company.name)
        .bind(&company.code)
        .bind(company.kind)
        .bind(company.status)
        .bind(company.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_company(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE companies SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- User Operations --

    pub async fn insert_user(&self, user: &NewUser) -> anyhow::Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"INSERT INTO users (company_id, username, password, nickname, email, phone, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, company_id, username, password, nickname, email, phone, status, created_at, updated_at"#,
        )
        .bind(user.company_id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn user(&self, id: i64) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, company_id, username, password, nickname, email, phone, status, created_at, updated_at
             FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, company_id, username, password, nickname, email, phone, status, created_at, updated_at
             FROM users WHERE username = $1 AND deleted_at IS NULL",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn list_users(
        &self,
        page: i64,
        page_size: i64,
        company_id: Option<i64>,
        username_like: Option<String>,
        nickname_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<UserRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::text IS NULL OR username LIKE $2)
               AND ($3::text IS NULL OR nickname LIKE $3)
               AND ($4::smallint IS NULL OR status = $4)",
        )
        .bind(company_id)
        .bind(&username_like)
        .bind(&nickname_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, company_id, username, password, nickname, email, phone, status, created_at, updated_at
             FROM users
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::text IS NULL OR username LIKE $2)
               AND ($3::text IS NULL OR nickname LIKE $3)
               AND ($4::smallint IS NULL OR status = $4)
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6",
        )
        .bind(company_id)
        .bind(&username_like)
        .bind(&nickname_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_user(&self, user: &UserRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE users
             SET company_id = $1, username = $2, nickname = $3, email = $4, phone = $5,
                 status = $6, updated_at = NOW()
             WHERE id = $7 AND deleted_at IS NULL",
        )
        .bind(user.company_id)
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.status)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_user_password(&self, id: i64, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn soft_delete_user(&self, id: i64) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn user_role_ids(&self, user_id: i64) -> anyhow::Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn roles_for_user(&self, user_id: i64) -> anyhow::Result<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT r.id, r.name, r.code, r.status, r.created_at, r.updated_at
             FROM roles r
             JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = $1 AND r.deleted_at IS NULL
             ORDER BY r.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace-set semantics: the user's assignment becomes exactly `role_ids`.
    pub async fn assign_user_roles(&self, user_id: i64, role_ids: &[i64]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role_id in role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // -- Role Operations --

    pub async fn insert_role(&self, role: &NewRole) -> anyhow::Result<RoleRow> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"INSERT INTO roles (name, code, status)
               VALUES ($1, $2, $3)
               RETURNING id, name, code, status, created_at, updated_at"#,
        )
        .bind(&role.name)
        .bind(&role.code)
        .bind(role.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn role(&self, id: i64) -> anyhow::Result<Option<RoleRow>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, code, status, created_at, updated_at
             FROM roles WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn role_by_code(
        &self,
        code: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<RoleRow>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, code, status, created_at, updated_at
             FROM roles
             WHERE code = $1 AND deleted_at IS NULL AND ($2::bigint IS NULL OR id != $2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Role rows for the token's role-id set. Dangling ids (deleted roles)
    /// simply resolve to nothing.
    pub async fn roles_by_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<RoleRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, code, status, created_at, updated_at
             FROM roles WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_roles(
        &self,
        page: i64,
        page_size: i64,
        name_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<RoleRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM roles
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)",
        )
        .bind(&name_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, code, status, created_at, updated_at
             FROM roles
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(&name_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_role(&self, role: &RoleRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE roles SET name = $1, code = $2, status = $3, updated_at = NOW()
             WHERE id = $4 AND deleted_at IS NULL",
        )
        .bind(&role.name)
        .bind(&role.code)
        .bind(role.status)
        .bind(role.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_role(&self, id: i64) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE roles SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn menus_for_role(&self, role_id: i64) -> anyhow::Result<Vec<MenuRow>> {
        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT m.id, m.parent_id, m.name, m.path, m.component, m.icon, m.sort, m.kind,
                    m.status, m.created_at, m.updated_at
             FROM menus m
             JOIN role_menus rm ON rm.menu_id = m.id
             WHERE rm.role_id = $1 AND m.deleted_at IS NULL
             ORDER BY m.sort ASC, m.id ASC",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn assign_role_menus(&self, role_id: i64, menu_ids: &[i64]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_menus WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for menu_id in menu_ids {
            sqlx::query("INSERT INTO role_menus (role_id, menu_id) VALUES ($1, $2)")
                .bind(role_id)
                .bind(menu_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // -- Menu Operations --

    pub async fn insert_menu(&self, menu: &NewMenu) -> anyhow::Result<MenuRow> {
        let row = sqlx::query_as::<_, MenuRow>(
            r#"INSERT INTO menus (parent_id, name, path, component, icon, sort, kind, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, parent_id, name, path, component, icon, sort, kind, status, created_at, updated_at"#,
        )
        .bind(menu.parent_id)
        .bind(&menu.name)
        .bind(&menu.path)
        .bind(&menu.component)
        .bind(&menu.icon)
        .bind(menu.sort)
        .bind(menu.kind)
        .bind(menu.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn menu(&self, id: i64) -> anyhow::Result<Option<MenuRow>> {
        let row = sqlx::query_as::<_, MenuRow>(
            "SELECT id, parent_id, name, path, component, icon, sort, kind, status, created_at, updated_at
             FROM menus WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn all_menus(&self) -> anyhow::Result<Vec<MenuRow>> {
        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT id, parent_id, name, path, component, icon, sort, kind, status, created_at, updated_at
             FROM menus WHERE deleted_at IS NULL ORDER BY sort ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn menus_by_parent(&self, parent_id: i64) -> anyhow::Result<Vec<MenuRow>> {
        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT id, parent_id, name, path, component, icon, sort, kind, status, created_at, updated_at
             FROM menus WHERE parent_id = $1 AND deleted_at IS NULL ORDER BY sort ASC, id ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_menus(
        &self,
        page: i64,
        page_size: i64,
        name_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<MenuRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM menus
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)",
        )
        .bind(&name_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT id, parent_id, name, path, component, icon, sort, kind, status, created_at, updated_at
             FROM menus
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR name LIKE $1)
               AND ($2::smallint IS NULL OR status = $2)
             ORDER BY sort ASC, id ASC
             LIMIT $3 OFFSET $4",
        )
        .bind(&name_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_menu(&self, menu: &MenuRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE menus
             SET parent_id = $1, name = $2, path = $3, component = $4, icon = $5,
                 sort = $6, kind = $7, status = $8, updated_at = NOW()
             WHERE id = $9 AND deleted_at IS NULL",
        )
        .bind(menu.parent_id)
        .bind(&menu.name)
        .bind(&menu.path)
        .bind(&menu.component)
        .bind(&menu.icon)
        .bind(menu.sort)
        .bind(menu.kind)
        .bind(menu.status)
        .bind(menu.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_menu(&self, id: i64) -> anyhow::Result<bool> {
        let result =
            sqlx::query("UPDATE menus SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Field Permission Operations --

    pub async fn insert_field_permission(
        &self,
        permission: &NewFieldPermission,
    ) -> anyhow::Result<FieldPermissionRow> {
        let row = sqlx::query_as::<_, FieldPermissionRow>(
            r#"INSERT INTO field_permissions (role_id, module, field, viewable, editable, report_visible, special_edit)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at"#,
        )
        .bind(permission.role_id)
        .bind(&permission.module)
        .bind(&permission.field)
        .bind(permission.viewable)
        .bind(permission.editable)
        .bind(permission.report_visible)
        .bind(permission.special_edit)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn field_permission(&self, id: i64) -> anyhow::Result<Option<FieldPermissionRow>> {
        let row = sqlx::query_as::<_, FieldPermissionRow>(
            "SELECT id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at
             FROM field_permissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Duplicate probe for the `(role_id, module, field)` uniqueness rule.
    pub async fn find_field_permission(
        &self,
        role_id: i64,
        module: &str,
        field: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<FieldPermissionRow>> {
        let row = sqlx::query_as::<_, FieldPermissionRow>(
            "SELECT id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at
             FROM field_permissions
             WHERE role_id = $1 AND module = $2 AND field = $3 AND deleted_at IS NULL
               AND ($4::bigint IS NULL OR id != $4)",
        )
        .bind(role_id)
        .bind(module)
        .bind(field)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_field_permissions(
        &self,
        page: i64,
        page_size: i64,
        role_id: Option<i64>,
        module: Option<String>,
        field_like: Option<String>,
    ) -> anyhow::Result<(Vec<FieldPermissionRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM field_permissions
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR role_id = $1)
               AND ($2::text IS NULL OR module = $2)
               AND ($3::text IS NULL OR field LIKE $3)",
        )
        .bind(role_id)
        .bind(&module)
        .bind(&field_like)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, FieldPermissionRow>(
            "SELECT id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at
             FROM field_permissions
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR role_id = $1)
               AND ($2::text IS NULL OR module = $2)
               AND ($3::text IS NULL OR field LIKE $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(role_id)
        .bind(&module)
        .bind(&field_like)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn field_permissions_by_role_module(
        &self,
        role_id: i64,
        module: &str,
    ) -> anyhow::Result<Vec<FieldPermissionRow>> {
        let rows = sqlx::query_as::<_, FieldPermissionRow>(
            "SELECT id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at
             FROM field_permissions
             WHERE role_id = $1 AND module = $2 AND deleted_at IS NULL
             ORDER BY field ASC",
        )
        .bind(role_id)
        .bind(module)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn field_permissions_for(
        &self,
        role_ids: &[i64],
        module: &str,
        field: &str,
    ) -> anyhow::Result<Vec<FieldPermissionRow>> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query_as::<_, FieldPermissionRow>(
            "SELECT id, role_id, module, field, viewable, editable, report_visible, special_edit, created_at, updated_at
             FROM field_permissions
             WHERE role_id = ANY($1) AND module = $2 AND field = $3 AND deleted_at IS NULL",
        )
        .bind(role_ids)
        .bind(module)
        .bind(field)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Does any of the roles carry the special edit override for the field?
    pub async fn special_edit_exists(
        &self,
        role_ids: &[i64],
        module: &str,
        field: &str,
    ) -> anyhow::Result<bool> {
        if role_ids.is_empty() {
            return Ok(false);
        }
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM field_permissions
                 WHERE role_id = ANY($1) AND module = $2 AND field = $3
                   AND special_edit = 1 AND deleted_at IS NULL
             )",
        )
        .bind(role_ids)
        .bind(module)
        .bind(field)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn save_field_permission(
        &self,
        permission: &FieldPermissionRow,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE field_permissions
             SET role_id = $1, module = $2, field = $3, viewable = $4, editable = $5,
                 report_visible = $6, special_edit = $7, updated_at = NOW()
             WHERE id = $8 AND deleted_at IS NULL",
        )
        .bind(permission.role_id)
        .bind(&permission.module)
        .bind(&permission.field)
        .bind(permission.viewable)
        .bind(permission.editable)
        .bind(permission.report_visible)
        .bind(permission.special_edit)
        .bind(permission.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_field_permission(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE field_permissions SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Data Dictionary Operations --

    pub async fn insert_dictionary_entry(
        &self,
        entry: &NewDictionaryEntry,
    ) -> anyhow::Result<DataDictionaryRow> {
        let row = sqlx::query_as::<_, DataDictionaryRow>(
            r#"INSERT INTO data_dictionary
                   (module, field, label, description, required, editable, data_type, max_length, options, default_value, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at"#,
        )
        .bind(&entry.module)
        .bind(&entry.field)
        .bind(&entry.label)
        .bind(&entry.description)
        .bind(entry.required)
        .bind(entry.editable)
        .bind(&entry.data_type)
        .bind(entry.max_length)
        .bind(&entry.options)
        .bind(&entry.default_value)
        .bind(entry.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn dictionary_entry_by_id(
        &self,
        id: i64,
    ) -> anyhow::Result<Option<DataDictionaryRow>> {
        let row = sqlx::query_as::<_, DataDictionaryRow>(
            "SELECT id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at
             FROM data_dictionary WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// The permission fallback read: only enabled entries participate.
    pub async fn active_dictionary_entry(
        &self,
        module: &str,
        field: &str,
    ) -> anyhow::Result<Option<DataDictionaryRow>> {
        let row = sqlx::query_as::<_, DataDictionaryRow>(
            "SELECT id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at
             FROM data_dictionary
             WHERE module = $1 AND field = $2 AND status = 1 AND deleted_at IS NULL",
        )
        .bind(module)
        .bind(field)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn dictionary_by_module_field(
        &self,
        module: &str,
        field: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<DataDictionaryRow>> {
        let row = sqlx::query_as::<_, DataDictionaryRow>(
            "SELECT id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at
             FROM data_dictionary
             WHERE module = $1 AND field = $2 AND deleted_at IS NULL
               AND ($3::bigint IS NULL OR id != $3)",
        )
        .bind(module)
        .bind(field)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn dictionary_by_module(
        &self,
        module: &str,
    ) -> anyhow::Result<Vec<DataDictionaryRow>> {
        let rows = sqlx::query_as::<_, DataDictionaryRow>(
            "SELECT id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at
             FROM data_dictionary
             WHERE module = $1 AND deleted_at IS NULL
             ORDER BY field ASC",
        )
        .bind(module)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_dictionary(
        &self,
        page: i64,
        page_size: i64,
        module: Option<String>,
        field_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<DataDictionaryRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM data_dictionary
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR module = $1)
               AND ($2::text IS NULL OR field LIKE $2)
               AND ($3::smallint IS NULL OR status = $3)",
        )
        .bind(&module)
        .bind(&field_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, DataDictionaryRow>(
            "SELECT id, module, field, label, description, required, editable, data_type, max_length, options, default_value, status, created_at, updated_at
             FROM data_dictionary
             WHERE deleted_at IS NULL
               AND ($1::text IS NULL OR module = $1)
               AND ($2::text IS NULL OR field LIKE $2)
               AND ($3::smallint IS NULL OR status = $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(&module)
        .bind(&field_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_dictionary_entry(&self, entry: &DataDictionaryRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE data_dictionary
             SET module = $1, field = $2, label = $3, description = $4, required = $5,
                 editable = $6, data_type = $7, max_length = $8, options = $9,
                 default_value = $10, status = $11, updated_at = NOW()
             WHERE id = $12 AND deleted_at IS NULL",
        )
        .bind(&entry.module)
        .bind(&entry.field)
        .bind(&entry.label)
        .bind(&entry.description)
        .bind(entry.required)
        .bind(entry.editable)
        .bind(&entry.data_type)
        .bind(entry.max_length)
        .bind(&entry.options)
        .bind(&entry.default_value)
        .bind(entry.status)
        .bind(entry.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_dictionary_entry(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE data_dictionary SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Access Credential Operations --

    pub async fn active_credential(&self, company_id: i64) -> anyhow::Result<Option<CredentialRow>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, company_id, app_key, app_secret, token, expires_in, expires_at, refreshed_at, status, created_at, updated_at
             FROM access_credentials
             WHERE company_id = $1 AND status = 1 AND deleted_at IS NULL",
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Any live credential row for the company, regardless of status.
    pub async fn credential_exists(&self, company_id: i64) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM access_credentials WHERE company_id = $1 AND deleted_at IS NULL
             )",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn credential_by_id(&self, id: i64) -> anyhow::Result<Option<CredentialRow>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, company_id, app_key, app_secret, token, expires_in, expires_at, refreshed_at, status, created_at, updated_at
             FROM access_credentials WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert_credential(
        &self,
        credential: &NewCredential,
    ) -> anyhow::Result<CredentialRow> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"INSERT INTO access_credentials
                   (company_id, app_key, app_secret, token, expires_in, expires_at, refreshed_at, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
               RETURNING id, company_id, app_key, app_secret, token, expires_in, expires_at, refreshed_at, status, created_at, updated_at"#,
        )
        .bind(credential.company_id)
        .bind(&credential.app_key)
        .bind(&credential.app_secret)
        .bind(&credential.token)
        .bind(credential.expires_in)
        .bind(credential.expires_at)
        .bind(credential.refreshed_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// In-place update covering both config changes and token refreshes.
    pub async fn save_credential(&self, credential: &CredentialRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE access_credentials
             SET app_key = $1, app_secret = $2, token = $3, expires_in = $4,
                 expires_at = $5, refreshed_at = $6, status = $7, updated_at = NOW()
             WHERE id = $8 AND deleted_at IS NULL",
        )
        .bind(&credential.app_key)
        .bind(&credential.app_secret)
        .bind(&credential.token)
        .bind(credential.expires_in)
        .bind(credential.expires_at)
        .bind(credential.refreshed_at)
        .bind(credential.status)
        .bind(credential.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_credential(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE access_credentials SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_credentials(
        &self,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<(Vec<CredentialRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM access_credentials WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, company_id, app_key, app_secret, token, expires_in, expires_at, refreshed_at, status, created_at, updated_at
             FROM access_credentials
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    // -- API Config Operations --

    pub async fn insert_api_config(&self, config: &NewApiConfig) -> anyhow::Result<ApiConfigRow> {
        let row = sqlx::query_as::<_, ApiConfigRow>(
            r#"INSERT INTO api_configs
                   (company_id, name, code, version, kind, base_url, path, method, params, headers, description, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING id, company_id, name, code, version, kind, base_url, path, method, params, headers, description, status, created_at, updated_at"#,
        )
        .bind(config.company_id)
        .bind(&config.name)
        .bind(&config.code)
        .bind(&config.version)
        .bind(config.kind)
        .bind(&config.base_url)
        .bind(&config.path)
        .bind(&config.method)
        .bind(&config.params)
        .bind(&config.headers)
        .bind(&config.description)
        .bind(config.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn api_config(&self, id: i64) -> anyhow::Result<Option<ApiConfigRow>> {
        let row = sqlx::query_as::<_, ApiConfigRow>(
            "SELECT id, company_id, name, code, version, kind, base_url, path, method, params, headers, description, status, created_at, updated_at
             FROM api_configs WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn api_config_by_code(
        &self,
        code: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<ApiConfigRow>> {
        let row = sqlx::query_as::<_, ApiConfigRow>(
            "SELECT id, company_id, name, code, version, kind, base_url, path, method, params, headers, description, status, created_at, updated_at
             FROM api_configs
             WHERE code = $1 AND deleted_at IS NULL AND ($2::bigint IS NULL OR id != $2)",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_api_configs(
        &self,
        page: i64,
        page_size: i64,
        company_id: Option<i64>,
        name_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<ApiConfigRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM api_configs
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::text IS NULL OR name LIKE $2)
               AND ($3::smallint IS NULL OR status = $3)",
        )
        .bind(company_id)
        .bind(&name_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ApiConfigRow>(
            "SELECT id, company_id, name, code, version, kind, base_url, path, method, params, headers, description, status, created_at, updated_at
             FROM api_configs
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::text IS NULL OR name LIKE $2)
               AND ($3::smallint IS NULL OR status = $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(company_id)
        .bind(&name_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_api_config(&self, config: &ApiConfigRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE api_configs
             SET company_id = $1, name = $2, code = $3, version = $4, kind = $5, base_url = $6,
                 path = $7, method = $8, params = $9, headers = $10, description = $11,
                 status = $12, updated_at = NOW()
             WHERE id = $13 AND deleted_at IS NULL",
        )
        .bind(config.company_id)
        .bind(&config.name)
        .bind(&config.code)
        .bind(&config.version)
        .bind(config.kind)
        .bind(&config.base_url)
        .bind(&config.path)
        .bind(&config.method)
        .bind(&config.params)
        .bind(&config.headers)
        .bind(&config.description)
        .bind(config.status)
        .bind(config.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_api_config(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE api_configs SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- API Test Case Operations --

    pub async fn insert_test_case(&self, case: &NewApiTestCase) -> anyhow::Result<ApiTestCaseRow> {
        let row = sqlx::query_as::<_, ApiTestCaseRow>(
            r#"INSERT INTO api_test_cases
                   (company_id, api_config_id, name, description, params, headers, expected_result, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, company_id, api_config_id, name, description, params, headers, expected_result, status, created_at, updated_at"#,
        )
        .bind(case.company_id)
        .bind(case.api_config_id)
        .bind(&case.name)
        .bind(&case.description)
        .bind(&case.params)
        .bind(&case.headers)
        .bind(&case.expected_result)
        .bind(case.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn test_case(&self, id: i64) -> anyhow::Result<Option<ApiTestCaseRow>> {
        let row = sqlx::query_as::<_, ApiTestCaseRow>(
            "SELECT id, company_id, api_config_id, name, description, params, headers, expected_result, status, created_at, updated_at
             FROM api_test_cases WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_test_cases(
        &self,
        page: i64,
        page_size: i64,
        company_id: Option<i64>,
        api_config_id: Option<i64>,
        name_like: Option<String>,
        status: Option<i16>,
    ) -> anyhow::Result<(Vec<ApiTestCaseRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM api_test_cases
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::bigint IS NULL OR api_config_id = $2)
               AND ($3::text IS NULL OR name LIKE $3)
               AND ($4::smallint IS NULL OR status = $4)",
        )
        .bind(company_id)
        .bind(api_config_id)
        .bind(&name_like)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ApiTestCaseRow>(
            "SELECT id, company_id, api_config_id, name, description, params, headers, expected_result, status, created_at, updated_at
             FROM api_test_cases
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::bigint IS NULL OR api_config_id = $2)
               AND ($3::text IS NULL OR name LIKE $3)
               AND ($4::smallint IS NULL OR status = $4)
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6",
        )
        .bind(company_id)
        .bind(api_config_id)
        .bind(&name_like)
        .bind(status)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn save_test_case(&self, case: &ApiTestCaseRow) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE api_test_cases
             SET company_id = $1, api_config_id = $2, name = $3, description = $4,
                 params = $5, headers = $6, expected_result = $7, status = $8, updated_at = NOW()
             WHERE id = $9 AND deleted_at IS NULL",
        )
        .bind(case.company_id)
        .bind(case.api_config_id)
        .bind(&case.name)
        .bind(&case.description)
        .bind(&case.params)
        .bind(&case.headers)
        .bind(&case.expected_result)
        .bind(case.status)
        .bind(case.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_test_case(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE api_test_cases SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- API Test History Operations --

    pub async fn insert_test_history(
        &self,
        history: &NewTestHistory,
    ) -> anyhow::Result<ApiTestHistoryRow> {
        let row = sqlx::query_as::<_, ApiTestHistoryRow>(
            r#"INSERT INTO api_test_history
                   (company_id, user_id, api_config_id, test_case_id, name, params, headers,
                    actual_result, status, response_time_ms, status_code, error_message)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING id, company_id, user_id, api_config_id, test_case_id, name, params, headers,
                         actual_result, status, response_time_ms, status_code, error_message, created_at"#,
        )
        .bind(history.company_id)
        .bind(history.user_id)
        .bind(history.api_config_id)
        .bind(history.test_case_id)
        .bind(&history.name)
        .bind(&history.params)
        .bind(&history.headers)
        .bind(&history.actual_result)
        .bind(&history.status)
        .bind(history.response_time_ms)
        .bind(history.status_code)
        .bind(&history.error_message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_test_history(
        &self,
        page: i64,
        page_size: i64,
        company_id: Option<i64>,
        api_config_id: Option<i64>,
        user_id: Option<i64>,
    ) -> anyhow::Result<(Vec<ApiTestHistoryRow>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM api_test_history
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::bigint IS NULL OR api_config_id = $2)
               AND ($3::bigint IS NULL OR user_id = $3)",
        )
        .bind(company_id)
        .bind(api_config_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ApiTestHistoryRow>(
            "SELECT id, company_id, user_id, api_config_id, test_case_id, name, params, headers,
                    actual_result, status, response_time_ms, status_code, error_message, created_at
             FROM api_test_history
             WHERE deleted_at IS NULL
               AND ($1::bigint IS NULL OR company_id = $1)
               AND ($2::bigint IS NULL OR api_config_id = $2)
               AND ($3::bigint IS NULL OR user_id = $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(company_id)
        .bind(api_config_id)
        .bind(user_id)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}

// -- Row Types --

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub code: String,
    pub kind: i16,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub company_id: i64,
    pub username: String,
    /// Argon2 PHC string; never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MenuRow {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub path: String,
    pub component: String,
    pub icon: String,
    pub sort: i32,
    pub kind: i16,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FieldPermissionRow {
    pub id: i64,
    pub role_id: i64,
    pub module: String,
    pub field: String,
    pub viewable: i16,
    pub editable: i16,
    pub report_visible: i16,
    pub special_edit: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DataDictionaryRow {
    pub id: i64,
    pub module: String,
    pub field: String,
    pub label: String,
    pub description: String,
    pub required: i16,
    pub editable: i16,
    pub data_type: String,
    pub max_length: i32,
    pub options: String,
    pub default_value: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CredentialRow {
    pub id: i64,
    pub company_id: i64,
    pub app_key: String,
    /// Stored for refreshes; redacted from every response.
    #[serde(skip_serializing)]
    pub app_secret: String,
    pub token: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiConfigRow {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub code: String,
    pub version: String,
    pub kind: i16,
    pub base_url: String,
    pub path: String,
    pub method: String,
    pub params: String,
    pub headers: String,
    pub description: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiTestCaseRow {
    pub id: i64,
    pub company_id: i64,
    pub api_config_id: i64,
    pub name: String,
    pub description: String,
    pub params: String,
    pub headers: String,
    pub expected_result: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiTestHistoryRow {
    pub id: i64,
    pub company_id: i64,
    pub user_id: i64,
    pub api_config_id: i64,
    pub test_case_id: i64,
    pub name: String,
    pub params: String,
    pub headers: String,
    pub actual_result: String,
    pub status: String,
    pub response_time_ms: i64,
    pub status_code: i32,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

// -- Insert Payloads --

#[derive(Debug, Deserialize)]
pub struct NewCompany {
    #[serde(default)]
    pub parent_id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub kind: i16,
    #[serde(default)]
    pub status: i16,
}

#[derive(Debug)]
pub struct NewUser {
    pub company_id: i64,
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub status: i16,
}

#[derive(Debug, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub status: i16,
}

#[derive(Debug, Deserialize)]
pub struct NewMenu {
    #[serde(default)]
    pub parent_id: i64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub kind: i16,
    #[serde(default)]
    pub status: i16,
}

#[derive(Debug)]
pub struct NewFieldPermission {
    pub role_id: i64,
    pub module: String,
    pub field: String,
    pub viewable: i16,
    pub editable: i16,
    pub report_visible: i16,
    pub special_edit: i16,
}

#[derive(Debug)]
pub struct NewDictionaryEntry {
    pub module: String,
    pub field: String,
    pub label: String,
    pub description: String,
    pub required: i16,
    pub editable: i16,
    pub data_type: String,
    pub max_length: i32,
    pub options: String,
    pub default_value: String,
    pub status: i16,
}

#[derive(Debug)]
pub struct NewCredential {
    pub company_id: i64,
    pub app_key: String,
    pub app_secret: String,
    pub token: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewApiConfig {
    pub company_id: i64,
    pub name: String,
    pub code: String,
    pub version: String,
    pub kind: i16,
    pub base_url: String,
    pub path: String,
    pub method: String,
    pub params: String,
    pub headers: String,
    pub description: String,
    pub status: i16,
}

#[derive(Debug)]
pub struct NewApiTestCase {
    pub company_id: i64,
    pub api_config_id: i64,
    pub name: String,
    pub description: String,
    pub params: String,
    pub headers: String,
    pub expected_result: String,
    pub status: i16,
}

#[derive(Debug)]
pub struct NewTestHistory {
    pub company_id: i64,
    pub user_id: i64,
    pub api_config_id: i64,
    pub test_case_id: i64,
    pub name: String,
    pub params: String,
    pub headers: String,
    pub actual_result: String,
    pub status: String,
    pub response_time_ms: i64,
    pub status_code: i32,
    pub error_message: String,
}
