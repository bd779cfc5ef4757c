//! Tenant domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tenant entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Tenant {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tenant-scoped principal. Lives in one tenant's namespace only; its
/// role assignments never reach across tenant boundaries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantUser {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_tenant_admin: bool,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TenantUser {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            email: None,
            username: None,
            password_hash: String::new(),
            is_tenant_admin: false,
            is_suspended: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a tenant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

/// Credentials for a tenant-scoped login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TenantLoginInput {
    pub tenant_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub identity: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_user_default_is_unprivileged() {
        let tu = TenantUser::default();
        assert!(!tu.is_tenant_admin);
        assert!(!tu.is_suspended);
        assert!(tu.tenant_id.is_nil());
    }

    #[test]
    fn test_create_tenant_input_empty_name() {
        let input = CreateTenantInput {
            name: String::new(),
            description: None,
        };
        assert!(input.validate().is_err());
    }
}
