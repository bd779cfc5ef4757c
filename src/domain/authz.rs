//! Global-scope authorization domain models
//!
//! Permissions are identified by a `(resource_code, action_code)` pair and
//! presented on the wire as an opaque `ACTION:RESOURCE` string (e.g.
//! `READ:ASN_REGISTRY`). The tenant-scoped mirror of this hierarchy lives
//! in [`super::tenant_authz`]; the two are type-distinct on purpose so a
//! missed scope filter cannot leak grants across tenant boundaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Resource catalog entry (e.g. ASN_REGISTRY, PROTOCOL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

/// Action catalog entry (e.g. READ, CREATE, DELETE)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Action {
    pub code: String,
    pub name: String,
}

/// Global permission entity
///
/// `resource` and `action` are denormalized catalog records attached by
/// code lookup during resolution. A permission whose catalog entry was
/// renamed keeps resolving with `None` here instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub resource_code: String,
    pub action_code: String,
    #[sqlx(skip)]
    pub resource: Option<Resource>,
    #[sqlx(skip)]
    pub action: Option<Action>,
}

impl Default for Permission {
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

impl Permission {
    /// Wire representation of the permission (`ACTION:RESOURCE`)
    pub fn code(&self) -> String {
        format!("{}:{}", self.action_code, self.resource_code)
    }
}

/// Global role entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Role {
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

/// Role-Permission mapping (unique per pair; re-granting is a no-op)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission_id: Uuid,
}

/// User-Role assignment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a global role
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<Uuid>>,
}

/// Input for updating a global role
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Input for replacing a user's role set wholesale
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceUserRolesInput {
    pub role_ids: Vec<Uuid>,
}

/// Role with its granted permissions (for API responses)
#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// A parsed `ACTION:RESOURCE` permission code.
///
/// Parsing is deliberately forgiving about case and surrounding
/// whitespace; a code that does not split into two non-empty parts is not
/// an error but simply a permission nobody holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCode {
    pub action: String,
    pub resource: String,
}

impl PermissionCode {
    pub fn parse(code: &str) -> Option<Self> {
        let mut parts = code.trim().split(':');
        let action = parts.next()?.trim().to_uppercase();
        let resource = parts.next()?.trim().to_uppercase();
        if parts.next().is_some() || action.is_empty() || resource.is_empty() {
            return None;
        }
        Some(Self { action, resource })
    }
}

impl std::fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

// Regex for catalog code validation (READ, ASN_REGISTRY, ...)
lazy_static::lazy_static! {
    pub static ref CATALOG_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
}
