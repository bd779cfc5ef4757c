//! Global-scope authorization repository

use crate::domain::{
    Action, CreateRoleInput, Page, PageGroup, Permission, Resource, Role, UpdateRoleInput, UserRole,
};
use crate::error::{AppError, Result};
use crate::repository::scope::{assignment_diff, ScopeStore};
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use uuid::Uuid;

/// Global authorization store: the `ScopeStore` lookups plus role and
/// assignment management.
#[async_trait]
pub trait AuthzRepository: ScopeStore<Permission = Permission> {
    // Permissions
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>>;
    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    // Roles
    async fn create_role(&self, input: &CreateRoleInput) -> Result<Role>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn update_role(&self, id: Uuid, input: &UpdateRoleInput) -> Result<Role>;
    /// Rejects with Conflict while the role still has live assignments.
    async fn delete_role(&self, id: Uuid) -> Result<()>;

    // Role-Permission grants
    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>>;

    // User-Role assignments
    async fn find_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>>;
    async fn find_user_role_rows(&self, user_id: Uuid) -> Result<Vec<UserRole>>;
    /// Diff-based wholesale replacement: removes only extraneous
    /// assignments and inserts only missing ones, in one transaction, so a
    /// concurrent resolution never observes an empty mid-update state and
    /// untouched assignments keep their row identity.
    async fn replace_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<()>;
    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()>;
}

pub struct AuthzRepositoryImpl {
    pool: MySqlPool,
}

impl AuthzRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScopeStore for AuthzRepositoryImpl {
    type Permission = Permission;

    async fn find_role_ids_for_principal(&self, principal_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT role_id FROM user_roles WHERE user_id = ?")
                .bind(principal_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_permission_ids_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb =
            QueryBuilder::<MySql>::new("SELECT permission_id FROM role_permissions WHERE role_id IN (");
        let mut sep = qb.separated(", ");
        for id in role_ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let rows: Vec<(Uuid,)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_permissions_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Permission>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, resource_code, action_code FROM permissions WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let permissions = qb
            .build_query_as::<Permission>()
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
            "SELECT DISTINCT page_id FROM page_permissions WHERE permission_id IN (",
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
                FROM user_roles ur
                INNER JOIN role_permissions rp ON rp.role_id = ur.role_id
                INNER JOIN permissions p ON p.id = rp.permission_id
                WHERE ur.user_id = ?
                  AND UPPER(p.action_code) = ?
                  AND UPPER(p.resource_code) = ?
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
impl AuthzRepository for AuthzRepositoryImpl {
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, resource_code, action_code FROM permissions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, resource_code, action_code FROM permissions",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn create_role(&self, input: &CreateRoleInput) -> Result<Role> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
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
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create role")))
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id IN (",
        );
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        qb.push(")");
        let roles = qb.build_query_as::<Role>().fetch_all(&self.pool).await?;
        Ok(roles)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at, updated_at FROM roles",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn update_role(&self, id: Uuid, input: &UpdateRoleInput) -> Result<Role> {
        let existing = self
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let description = input.description.as_ref().or(existing.description.as_ref());

        sqlx::query("UPDATE roles SET name = ?, description = ?, updated_at = NOW() WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update role")))
    }

    async fn delete_role(&self, id: Uuid) -> Result<()> {
        let (assignments,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_roles WHERE role_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if assignments > 0 {
            return Err(AppError::Conflict(format!(
                "Role {} still has {} user assignment(s)",
                id, assignments
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Role {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        // Duplicate grant is a no-op, not an error
        sqlx::query("INSERT IGNORE INTO role_permissions (role_id, permission_id) VALUES (?, ?)")
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_id = ?")
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.resource_code, p.action_code
            FROM permissions p
            INNER JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = ?
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn find_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.description, r.created_at, r.updated_at
            FROM roles r
            INNER JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    async fn find_user_role_rows(&self, user_id: Uuid) -> Result<Vec<UserRole>> {
        let rows = sqlx::query_as::<_, UserRole>(
            "SELECT id, user_id, role_id, created_at FROM user_roles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<()> {
        // Assignments present in both sets keep their original rows.
        let existing: Vec<Uuid> = self
            .find_user_role_rows(user_id)
            .await?
            .into_iter()
            .map(|row| row.role_id)
            .collect();
        let (removals, additions) = assignment_diff(&existing, role_ids);

        let mut tx = self.pool.begin().await?;

        for role_id in &removals {
            sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        for role_id in &additions {
            sqlx::query(
                "INSERT INTO user_roles (id, user_id, role_id, created_at) VALUES (?, ?, ?, NOW())",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role_id = ?")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
