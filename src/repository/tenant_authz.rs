//! Tenant-scope authorization repository
//!
//! Mirrors the global repository over the tenant entity set. The page
//! catalog itself is shared with the global scope; only the
//! `page_tenant_permissions` requirement edge is tenant-specific.

use crate::domain::{
    Action, CreateTenantRoleInput, Page, PageGroup, Resource, TenantPermission, TenantRole,
    TenantUser, TenantUserRole, UpdateTenantRoleInput,
};
use crate::error::{AppError, Result};
use crate::repository::scope::{assignment_diff, ScopeStore};
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use uuid::Uuid;

/// Tenant authorization store: `ScopeStore` lookups (principal =
/// tenant user) plus tenant role and assignment management.
#[async_trait]
pub trait TenantAuthzRepository: ScopeStore<Permission = TenantPermission> {
    // Permissions
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<TenantPermission>>;
    async fn list_permissions(&self) -> Result<Vec<TenantPermission>>;

    // Roles
    async fn create_role(&self, input: &CreateTenantRoleInput) -> Result<TenantRole>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<TenantRole>>;
    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TenantRole>>;
    async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<TenantRole>>;
    async fn update_role(&self, id: Uuid, input: &UpdateTenantRoleInput) -> Result<TenantRole>;
    /// Rejects with Conflict while the role still has live assignments.
    async fn delete_role(&self, id: Uuid) -> Result<()>;

    // Role-Permission grants
    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<TenantPermission>>;

    // TenantUser-Role assignments
    /// The tenant-user row, but only if it belongs to the given tenant.
    async fn find_tenant_user(
        &self,
        tenant_id: Uuid,
        tenant_user_id: Uuid,
    ) -> Result<Option<TenantUser>>;
    async fn find_user_roles(&self, tenant_user_id: Uuid) -> Result<Vec<TenantRole>>;
    async fn find_user_role_rows(&self, tenant_user_id: Uuid) -> Result<Vec<TenantUserRole>>;
    /// Diff-based wholesale replacement; see the global counterpart.
    async fn replace_user_roles(&self, tenant_user_id: Uuid, role_ids: &[Uuid]) -> Result<()>;
    async fn remove_user_role(&self, tenant_user_id: Uuid, role_id: Uuid) -> Result<()>;
}

pub struct TenantAuthzRepositoryImpl {
    pool: MySqlPool,
}

impl TenantAuthzRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopeStore for TenantAuthzRepositoryImpl {
    type Permission = TenantPermission;

    async fn find_role_ids_for_principal(&self, principal_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT tenant_role_id FROM tenant_user_roles WHERE tenant_user_id = ?",
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_permission_ids_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT tenant_permission_id FROM tenant_role_permissions WHERE tenant_role_id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in role_ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let rows: Vec<(Uuid,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_permissions_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TenantPermission>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, resource_code, action_code FROM tenant_permissions WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let permissions = qb
            .build_query_as::<TenantPermission>()
            .fetch_all(&self.pool)
            .await?;
        Ok(permissions)
    }

    async fn find_resources_by_codes(&self, codes: &[String]) -> Result<Vec<Resource>> {
        if codes.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT code, name, description FROM resources WHERE code IN (",
        );
        let mut sep = qb.separated(", ");
        for code in codes {
            sep.push_bind(code);
        }
        qb.push(")");
        let resources = qb
            .build_query_as::<Resource>()
            .fetch_all(&self.pool)
            .await?;
        Ok(resources)
    }

    async fn find_actions_by_codes(&self, codes: &[String]) -> Result<Vec<Action>> {
        if codes.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new("SELECT code, name FROM actions WHERE code IN (");
        let mut sep = qb.separated(", ");
        for code in codes {
            sep.push_bind(code);
        }
        qb.push(")");
        let actions = qb.build_query_as::<Action>().fetch_all(&self.pool).await?;
        Ok(actions)
    }

    async fn find_page_ids_for_permissions(&self, permission_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if permission_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT DISTINCT page_id FROM page_tenant_permissions WHERE tenant_permission_id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in permission_ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let rows: Vec<(Uuid,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_pages_by_ids(&self, page_ids: &[Uuid]) -> Result<Vec<Page>> {
        if page_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, code, path, page_group_id FROM pages WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in page_ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let pages = qb.build_query_as::<Page>().fetch_all(&self.pool).await?;
        Ok(pages)
    }

    async fn find_page_groups_by_ids(&self, group_ids: &[Uuid]) -> Result<Vec<PageGroup>> {
        if group_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, code, name, icon FROM page_groups WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in group_ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let groups = qb
            .build_query_as::<PageGroup>()
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    async fn holds_permission(
        &self,
        principal_id: Uuid,
        action: &str,
        resource: &str,
    ) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM tenant_user_roles tur
                INNER JOIN tenant_role_permissions trp ON trp.tenant_role_id = tur.tenant_role_id
                INNER JOIN tenant_permissions tp ON tp.id = trp.tenant_permission_id
                WHERE tur.tenant_user_id = ?
                  AND UPPER(tp.action_code) = ?
                  AND UPPER(tp.resource_code) = ?
            )
            "#,
        )
        .bind(principal_id)
        .bind(action)
        .bind(resource)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl TenantAuthzRepository for TenantAuthzRepositoryImpl {
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<TenantPermission>> {
        let permission = sqlx::query_as::<_, TenantPermission>(
            "SELECT id, resource_code, action_code FROM tenant_permissions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn list_permissions(&self) -> Result<Vec<TenantPermission>> {
        let permissions = sqlx::query_as::<_, TenantPermission>(
            "SELECT id, resource_code, action_code FROM tenant_permissions",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn create_role(&self, input: &CreateTenantRoleInput) -> Result<TenantRole> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO tenant_roles (id, tenant_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(&input.description)
        .execute(&self.pool)
        .await?;

        if let Some(permission_ids) = &input.permission_ids {
            for perm_id in permission_ids {
                self.assign_permission_to_role(id, *perm_id).await?;
            }
        }

        self.find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create tenant role")))
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<TenantRole>> {
        let role = sqlx::query_as::<_, TenantRole>(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM tenant_roles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TenantRole>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM tenant_roles WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let roles = qb
            .build_query_as::<TenantRole>()
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<TenantRole>> {
        let roles = sqlx::query_as::<_, TenantRole>(
            "SELECT id, tenant_id, name, description, created_at, updated_at FROM tenant_roles WHERE tenant_id = ?",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn update_role(&self, id: Uuid, input: &UpdateTenantRoleInput) -> Result<TenantRole> {
        let existing = self
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant role {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().or(existing.description.as_ref());

        sqlx::query(
            "UPDATE tenant_roles SET name = ?, description = ?, updated_at = NOW() WHERE id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update tenant role")))
    }

    async fn delete_role(&self, id: Uuid) -> Result<()> {
        let (assignments,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tenant_user_roles WHERE tenant_role_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if assignments > 0 {
            return Err(AppError::Conflict(format!(
                "Tenant role {} still has {} user assignment(s)",
                id, assignments
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tenant_role_permissions WHERE tenant_role_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tenant_roles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tenant role {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        // Duplicate grant is a no-op, not an error
        sqlx::query(
            "INSERT IGNORE INTO tenant_role_permissions (tenant_role_id, tenant_permission_id) VALUES (?, ?)",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM tenant_role_permissions WHERE tenant_role_id = ? AND tenant_permission_id = ?",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<TenantPermission>> {
        let permissions = sqlx::query_as::<_, TenantPermission>(
            r#"
            SELECT tp.id, tp.resource_code, tp.action_code
            FROM tenant_permissions tp
            INNER JOIN tenant_role_permissions trp ON tp.id = trp.tenant_permission_id
            WHERE trp.tenant_role_id = ?
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn find_tenant_user(
        &self,
        tenant_id: Uuid,
        tenant_user_id: Uuid,
    ) -> Result<Option<TenantUser>> {
        let tenant_user = sqlx::query_as::<_, TenantUser>(
            r#"
            SELECT id, tenant_id, email, username, password_hash, is_tenant_admin, is_suspended, created_at, updated_at
            FROM tenant_users
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(tenant_user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant_user)
    }

    async fn find_user_roles(&self, tenant_user_id: Uuid) -> Result<Vec<TenantRole>> {
        let roles = sqlx::query_as::<_, TenantRole>(
            r#"
            SELECT tr.id, tr.tenant_id, tr.name, tr.description, tr.created_at, tr.updated_at
            FROM tenant_roles tr
            INNER JOIN tenant_user_roles tur ON tr.id = tur.tenant_role_id
            WHERE tur.tenant_user_id = ?
            "#,
        )
        .bind(tenant_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn find_user_role_rows(&self, tenant_user_id: Uuid) -> Result<Vec<TenantUserRole>> {
        let rows = sqlx::query_as::<_, TenantUserRole>(
            "SELECT id, tenant_user_id, tenant_role_id, created_at FROM tenant_user_roles WHERE tenant_user_id = ?",
        )
        .bind(tenant_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_user_roles(&self, tenant_user_id: Uuid, role_ids: &[Uuid]) -> Result<()> {
        // Assignments present in both sets keep their original rows.
        let existing: Vec<Uuid> = self
            .find_user_role_rows(tenant_user_id)
            .await?
            .into_iter()
            .map(|row| row.tenant_role_id)
            .collect();
        let (removals, additions) = assignment_diff(&existing, role_ids);

        let mut tx = self.pool.begin().await?;

        for role_id in &removals {
            sqlx::query(
                "DELETE FROM tenant_user_roles WHERE tenant_user_id = ? AND tenant_role_id = ?",
            )
            .bind(tenant_user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        for role_id in &additions {
            sqlx::query(
                "INSERT INTO tenant_user_roles (id, tenant_user_id, tenant_role_id, created_at) VALUES (?, ?, ?, NOW())",
            )
            .bind(Uuid::new_v4())
            .bind(tenant_user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_user_role(&self, tenant_user_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM tenant_user_roles WHERE tenant_user_id = ? AND tenant_role_id = ?")
            .bind(tenant_user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
