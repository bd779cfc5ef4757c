//! Global-scope authorization service

use crate::domain::{
    CreateRoleInput, PageGroup, Permission, PermissionCode, ReplaceUserRolesInput, Role,
    RoleWithPermissions, UpdateRoleInput,
};
use crate::error::{AppError, Result};
use crate::repository::AuthzRepository;
use crate::service::resolver;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct AuthzService<R: AuthzRepository> {
    repository: Arc<R>,
}

impl<R: AuthzRepository> AuthzService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Every permission the user holds through global roles, deduplicated,
    /// with catalog detail attached where available.
    pub async fn get_user_permissions(&self, user_id: Uuid) -> Result<Vec<Permission>> {
        resolver::resolve_permissions(self.repository.as_ref(), user_id).await
    }

    /// The console navigation tree the user's global permissions unlock.
    pub async fn get_accessible_pages(&self, user_id: Uuid) -> Result<Vec<PageGroup>> {
        resolver::resolve_accessible_pages(self.repository.as_ref(), user_id).await
    }

    /// Point check for one `ACTION:RESOURCE` code. A code that does not
    /// parse is simply not held; only store failures surface as errors.
    pub async fn check_permission(&self, user_id: Uuid, code: &str) -> Result<bool> {
        let Some(parsed) = PermissionCode::parse(code) else {
            return Ok(false);
        };
        self.repository
            .holds_permission(user_id, &parsed.action, &parsed.resource)
            .await
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>> {
        self.repository.list_permissions().await
    }

    pub async fn create_role(&self, input: CreateRoleInput) -> Result<Role> {
        input.validate()?;
        self.repository.create_role(&input).await
    }

    pub async fn get_role(&self, id: Uuid) -> Result<RoleWithPermissions> {
        let role = self
            .repository
            .find_role_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", id)))?;
        let permissions = self.repository.find_role_permissions(id).await?;
        Ok(RoleWithPermissions { role, permissions })
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.repository.list_roles().await
    }

    pub async fn update_role(&self, id: Uuid, input: UpdateRoleInput) -> Result<Role> {
        input.validate()?;
        self.repository.update_role(id, &input).await
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<()> {
        self.repository.delete_role(id).await
    }

    pub async fn assign_permission_to_role(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<()> {
        self.repository
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", role_id)))?;
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
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<()> {
        self.repository
            .remove_permission_from_role(role_id, permission_id)
            .await
    }

    pub async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>> {
        self.repository.find_user_roles(user_id).await
    }

    /// Replace the user's role set wholesale. Every requested role must
    /// exist; assignments are then reconciled by diff so untouched roles
    /// keep their original assignment rows.
    pub async fn replace_user_roles(
        &self,
        user_id: Uuid,
        input: ReplaceUserRolesInput,
    ) -> Result<Vec<Role>> {
        let requested: Vec<Uuid> = input.role_ids;
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

        self.repository.replace_user_roles(user_id, &requested).await?;
        self.repository.find_user_roles(user_id).await
    }

    pub async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()> {
        self.repository.remove_user_role(user_id, role_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, Page, Resource, UserRole};
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Repo {}

        #[async_trait]
        impl crate::repository::ScopeStore for Repo {
            type Permission = Permission;

            async fn find_role_ids_for_principal(&self, principal_id: Uuid) -> Result<Vec<Uuid>>;
            async fn find_permission_ids_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>>;
            async fn find_permissions_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Permission>>;
            async fn find_resources_by_codes(&self, codes: &[String]) -> Result<Vec<Resource>>;
            async fn find_actions_by_codes(&self, codes: &[String]) -> Result<Vec<Action>>;
            async fn find_page_ids_for_permissions(&self, permission_ids: &[Uuid]) -> Result<Vec<Uuid>>;
            async fn find_pages_by_ids(&self, page_ids: &[Uuid]) -> Result<Vec<Page>>;
            async fn find_page_groups_by_ids(&self, group_ids: &[Uuid]) -> Result<Vec<PageGroup>>;
            async fn holds_permission(&self, principal_id: Uuid, action: &str, resource: &str) -> Result<bool>;
        }

        #[async_trait]
        impl AuthzRepository for Repo {
            async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>>;
            async fn list_permissions(&self) -> Result<Vec<Permission>>;
            async fn create_role(&self, input: &CreateRoleInput) -> Result<Role>;
            async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
            async fn find_roles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Role>>;
            async fn list_roles(&self) -> Result<Vec<Role>>;
            async fn update_role(&self, id: Uuid, input: &UpdateRoleInput) -> Result<Role>;
            async fn delete_role(&self, id: Uuid) -> Result<()>;
            async fn assign_permission_to_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
            async fn remove_permission_from_role(&self, role_id: Uuid, permission_id: Uuid) -> Result<()>;
            async fn find_role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>>;
            async fn find_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>>;
            async fn find_user_role_rows(&self, user_id: Uuid) -> Result<Vec<UserRole>>;
            async fn replace_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<()>;
            async fn remove_user_role(&self, user_id: Uuid, role_id: Uuid) -> Result<()>;
        }
    }

    fn role(id: Uuid, name: &str) -> Role {
        Role {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_check_permission_malformed_code_is_not_held() {
        let mut repo = MockRepo::new();
        // Store is never consulted for a code that does not parse.
        repo.expect_holds_permission().times(0);

        let service = AuthzService::new(Arc::new(repo));
        assert!(!service
            .check_permission(Uuid::new_v4(), "not-a-permission")
            .await
            .unwrap());
        assert!(!service.check_permission(Uuid::new_v4(), "").await.unwrap());
        assert!(!service
            .check_permission(Uuid::new_v4(), ":THREAT_EVENT")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_check_permission_normalizes_case() {
        let user_id = Uuid::new_v4();
        let mut repo = MockRepo::new();
        repo.expect_holds_permission()
            .with(eq(user_id), eq("READ"), eq("ASN_REGISTRY"))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let service = AuthzService::new(Arc::new(repo));
        assert!(service
            .check_permission(user_id, "read:asn_registry")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_get_role_not_found() {
        let mut repo = MockRepo::new();
        repo.expect_find_role_by_id().returning(|_| Ok(None));

        let service = AuthzService::new(Arc::new(repo));
        let result = service.get_role(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_assign_permission_requires_both_sides() {
        let role_id = Uuid::new_v4();
        let mut repo = MockRepo::new();
        repo.expect_find_role_by_id()
            .returning(move |id| Ok(Some(role(id, "analyst"))));
        repo.expect_find_permission_by_id().returning(|_| Ok(None));
        repo.expect_assign_permission_to_role().times(0);

        let service = AuthzService::new(Arc::new(repo));
        let result = service
            .assign_permission_to_role(role_id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_user_roles_rejects_unknown_role() {
        let user_id = Uuid::new_v4();
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();

        let mut repo = MockRepo::new();
        repo.expect_find_roles_by_ids()
            .returning(move |_| Ok(vec![role(known, "analyst")]));
        // The write must never run when validation fails.
        repo.expect_replace_user_roles().times(0);

        let service = AuthzService::new(Arc::new(repo));
        let result = service
            .replace_user_roles(
                user_id,
                ReplaceUserRolesInput {
                    role_ids: vec![known, unknown],
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_user_roles_returns_final_assignment() {
        let user_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();

        let mut repo = MockRepo::new();
        repo.expect_find_roles_by_ids()
            .returning(move |_| Ok(vec![role(role_id, "analyst")]));
        repo.expect_replace_user_roles()
            .withf(move |uid, ids| *uid == user_id && ids == [role_id])
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_find_user_roles()
            .returning(move |_| Ok(vec![role(role_id, "analyst")]));

        let service = AuthzService::new(Arc::new(repo));
        let roles = service
            .replace_user_roles(
                user_id,
                ReplaceUserRolesInput {
                    role_ids: vec![role_id],
                },
            )
            .await
            .unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].id, role_id);
    }

    #[tokio::test]
    async fn test_replace_user_roles_empty_set_clears_assignments() {
        let user_id = Uuid::new_v4();
        let mut repo = MockRepo::new();
        repo.expect_find_roles_by_ids()
            .withf(|ids| ids.is_empty())
            .returning(|_| Ok(vec![]));
        repo.expect_replace_user_roles()
            .withf(|_, ids| ids.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_find_user_roles().returning(|_| Ok(vec![]));

        let service = AuthzService::new(Arc::new(repo));
        let roles = service
            .replace_user_roles(user_id, ReplaceUserRolesInput { role_ids: vec![] })
            .await
            .unwrap();
        assert!(roles.is_empty());
    }
}
