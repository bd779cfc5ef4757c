//! Tenant-scope authorization service
//!
//! Mirrors the global service over the tenant hierarchy, with two extra
//! obligations: navigation output is sorted by code for stable tenant
//! menus, and every role operation is fenced to the tenant named in the
//! request so one tenant's roles can never touch another's users.

use crate::domain::{
    CreateTenantRoleInput, PageGroup, PermissionCode, ReplaceTenantUserRolesInput,
    TenantPermission, TenantRole, TenantRoleWithPermissions, TenantUser, UpdateTenantRoleInput,
};
use crate::error::{AppError, Result};
use crate::repository::TenantAuthzRepository;
use crate::service::resolver;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct TenantAuthzService<R: TenantAuthzRepository> {
    repository: Arc<R>,
}

impl<R: TenantAuthzRepository> TenantAuthzService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn get_tenant_user_permissions(
        &self,
        tenant_user_id: Uuid,
    ) -> Result<Vec<TenantPermission>> {
        resolver::resolve_permissions(self.repository.as_ref(), tenant_user_id).await
    }

    /// Accessible navigation tree, groups and pages both sorted by code.
    pub async fn get_accessible_pages(&self, tenant_user_id: Uuid) -> Result<Vec<PageGroup>> {
        let mut groups =
            resolver::resolve_accessible_pages(self.repository.as_ref(), tenant_user_id).await?;
        groups.sort_by(|a, b| a.code.cmp(&b.code));
        for group in &mut groups {
            group.pages.sort_by(|a, b| a.code.cmp(&b.code));
        }
        Ok(groups)
    }

    pub async fn check_permission(&self, tenant_user_id: Uuid, code: &str) -> Result<bool> {
        let Some(parsed) = PermissionCode::parse(code) else {
            return Ok(false);
        };
        self.repository
            .holds_permission(tenant_user_id, &parsed.action, &parsed.resource)
            .await
    }

    pub async fn list_permissions(&self) -> Result<Vec<TenantPermission>> {
        self.repository.list_permissions().await
    }

    pub async fn create_role(&self, input: CreateTenantRoleInput) -> Result<TenantRole> {
        input.validate()?;
        self.repository.create_role(&input).await
    }

    /// Fetch a role, treating a role from another tenant as absent.
    pub async fn get_role(&self, tenant_id: Uuid, id: Uuid) -> Result<TenantRoleWithPermissions> {
        let role = self.find_tenant_role(tenant_id, id).await?;
        let permissions = self.repository.find_role_permissions(id).await?;
        Ok(TenantRoleWithPermissions { role, permissions })
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<TenantRole>> {
        self.repository.list_roles(tenant_id).await
    }

    pub async fn update_role(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateTenantRoleInput,
    ) -> Result<TenantRole> {
        input.validate()?;
        self.find_tenant_role(tenant_id, id).await?;
        self.repository.update_role(id, &input).await
    }

    pub async fn delete_role(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        self.find_tenant_role(tenant_id, id).await?;
        self.repository.delete_role(id).await
    }

    pub async fn assign_permission_to_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<()> {
        self.find_tenant_role(tenant_id, role_id).await?;
        self.repository
            .find_permission_by_id(permission_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Permission {} not found", permission_id))
            })?;
        self.repository
            .assign_permission_to_role(role_id, permission_id)
            .await
    }

    pub async fn remove_permission_from_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<()> {
        self.find_tenant_role(tenant_id, role_id).await?;
        self.repository
            .remove_permission_from_role(role_id, permission_id)
            .await
    }

    pub async fn get_user_roles(
        &self,
        tenant_id: Uuid,
        tenant_user_id: Uuid,
    ) -> Result<Vec<TenantRole>> {
        self.find_member(tenant_id, tenant_user_id).await?;
        self.repository.find_user_roles(tenant_user_id).await
    }

    /// Replace a tenant user's role set. The target user and every
    /// requested role must belong to the tenant in the request path; the
    /// write is then a transactional diff against the current assignments.
    pub async fn replace_user_roles(
        &self,
        tenant_id: Uuid,
        tenant_user_id: Uuid,
        input: ReplaceTenantUserRolesInput,
    ) -> Result<Vec<TenantRole>> {
        self.find_member(tenant_id, tenant_user_id).await?;
        let requested = input.role_ids;
        let found = self.repository.find_roles_by_ids(&requested).await?;
        if found.len() != requested.len() {
            let known: Vec<Uuid> = found.iter().map(|r| r.id).collect();
            let missing = requested
                .iter()
                .find(|id| !known.contains(id))
                .copied()
                .unwrap_or_default();
            return Err(AppError::NotFound(format!("Role {} not found", missing)));
        }
        if let Some(foreign) = found.iter().find(|r| r.tenant_id != tenant_id) {
            return Err(AppError::BadRequest(format!(
                "Role {} belongs to a different tenant",
                foreign.id
            )));
        }

        self.repository
            .replace_user_roles(tenant_user_id, &requested)
            .await?;
        self.repository.find_user_roles(tenant_user_id).await
    }

    pub async fn remove_user_role(
        &self,
        tenant_id: Uuid,
        tenant_user_id: Uuid,
        role_id: Uuid,
    ) -> Result<()> {
        self.find_member(tenant_id, tenant_user_id).await?;
        self.repository.remove_user_role(tenant_user_id, role_id).await
    }

    /// The target user must belong to the path tenant; a user of any
    /// other tenant is treated as absent.
    async fn find_member(&self, tenant_id: Uuid, tenant_user_id: Uuid) -> Result<TenantUser> {
        self.repository
            .find_tenant_user(tenant_id, tenant_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Tenant user {} not found", tenant_user_id))
            })
    }

    async fn find_tenant_role(&self, tenant_id: Uuid, id: Uuid) -> Result<TenantRole> {
        let role = self
            .repository
            .find_role_by_id(id)
            .await?
            .filter(|r| r.tenant_id == tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;
        Ok(role)
    }
}
