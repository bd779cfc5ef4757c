//! Tenant-scope authorization domain models
//!
//! Structurally parallel to [`super::authz`] but a fully separate entity
//! set. Tenant roles carry their owning `tenant_id`; assigning a role from
//! another tenant is rejected before any write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::authz::{Action, Resource};

/// Tenant-scope permission entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantPermission {
    pub id: Uuid,
    pub resource_code: String,
    pub action_code: String,
    #[sqlx(skip)]
    pub resource: Option<Resource>,
    #[sqlx(skip)]
    pub action: Option<Action>,
}

impl Default for TenantPermission {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_code: String::new(),
            action_code: String::new(),
            resource: None,
            action: None,
        }
    }
}

impl TenantPermission {
    /// Wire representation of the permission (`ACTION:RESOURCE`)
    pub fn code(&self) -> String {
        format!("{}:{}", self.action_code, self.resource_code)
    }
}

/// Tenant role, owned by exactly one tenant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantRole {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TenantRole {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// TenantRole-TenantPermission mapping (unique per pair)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantRolePermission {
    pub tenant_role_id: Uuid,
    pub tenant_permission_id: Uuid,
}

/// TenantUser-TenantRole assignment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantUserRole {
    pub id: Uuid,
    pub tenant_user_id: Uuid,
    pub tenant_role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a tenant role
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantRoleInput {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Input for updating a tenant role
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTenantRoleInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Input for replacing a tenant user's role set wholesale
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceTenantUserRolesInput {
    pub role_ids: Vec<Uuid>,
}

/// Tenant role with its granted permissions (for API responses)
#[derive(Debug, Clone, Serialize)]
pub struct TenantRoleWithPermissions {
    #[serde(flatten)]
    pub role: TenantRole,
    pub permissions: Vec<TenantPermission>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_tenant_permission_code_rendering() {
        let perm = TenantPermission {
            resource_code: "TENANT_ASN".to_string(),
            action_code: "READ".to_string(),
            ..Default::default()
        };
        assert_eq!(perm.code(), "READ:TENANT_ASN");
    }

    #[test]
    fn test_create_tenant_role_input_valid() {
        let input = CreateTenantRoleInput {
            tenant_id: Uuid::new_v4(),
            name: "Tenant Analyst".to_string(),
            description: None,
            permission_ids: None,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_tenant_role_input_empty_name() {
        let input = CreateTenantRoleInput {
            tenant_id: Uuid::new_v4(),
            name: String::new(),
            description: None,
            permission_ids: None,
        };
        assert!(input.validate().is_err());
    }
}
