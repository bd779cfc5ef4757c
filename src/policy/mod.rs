//! Declarative endpoint authorization
//!
//! Each guarded endpoint states its requirement as data and hands the
//! decision to [`authorize`]. The gate answers one question per shape:
//! does this principal hold the named permission in the scope the shape
//! demands? Store failures propagate as infrastructure errors; the gate
//! never converts them into a deny. Denials carry a uniform message so a
//! Forbidden response reveals nothing about which permissions exist.

use crate::error::{AppError, Result};
use crate::middleware::Principal;
use async_trait::async_trait;
use uuid::Uuid;

/// What an endpoint demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRequirement {
    /// Only a global principal holding this code passes.
    Global(&'static str),
    /// Only a tenant principal of the tenant named in the request path,
    /// holding this code, passes.
    Tenant(&'static str),
    /// Elevated-or-local: a global principal holding the elevated code
    /// passes for any tenant; otherwise a tenant principal of the path
    /// tenant holding the local code passes.
    Either {
        global: &'static str,
        tenant: &'static str,
    },
}

/// Point permission probes and principal liveness, one pair per scope.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Does the token's subject still exist? A token can outlive it.
    async fn global_principal_exists(&self, user_id: Uuid) -> Result<bool>;
    async fn tenant_principal_exists(&self, tenant_user_id: Uuid) -> Result<bool>;
    async fn holds_global(&self, user_id: Uuid, code: &str) -> Result<bool>;
    async fn holds_tenant(&self, tenant_user_id: Uuid, code: &str) -> Result<bool>;
}

/// Permission codes named by endpoint requirements. Global-scope codes
/// and tenant-local codes share names where the capability is the same;
/// `TENANT_`-prefixed resources are the elevated cross-tenant variants
/// held by platform operators.
pub mod codes {
    pub const READ_PERMISSION: &str = "READ:PERMISSION";
    pub const CREATE_ROLE: &str = "CREATE:ROLE";
    pub const READ_ROLE: &str = "READ:ROLE";
    pub const UPDATE_ROLE: &str = "UPDATE:ROLE";
    pub const DELETE_ROLE: &str = "DELETE:ROLE";
    pub const READ_USER_ROLE: &str = "READ:USER_ROLE";
    pub const UPDATE_USER_ROLE: &str = "UPDATE:USER_ROLE";
    pub const UPDATE_USER: &str = "UPDATE:USER";
    pub const CREATE_TENANT: &str = "CREATE:TENANT";
    pub const READ_TENANT: &str = "READ:TENANT";

    pub const READ_TENANT_PERMISSION: &str = "READ:TENANT_PERMISSION";
    pub const CREATE_TENANT_ROLE: &str = "CREATE:TENANT_ROLE";
    pub const READ_TENANT_ROLE: &str = "READ:TENANT_ROLE";
    pub const UPDATE_TENANT_ROLE: &str = "UPDATE:TENANT_ROLE";
    pub const DELETE_TENANT_ROLE: &str = "DELETE:TENANT_ROLE";
    pub const READ_TENANT_USER_ROLE: &str = "READ:TENANT_USER_ROLE";
    pub const UPDATE_TENANT_USER_ROLE: &str = "UPDATE:TENANT_USER_ROLE";

    pub const READ_ASN_REGISTRY: &str = "READ:ASN_REGISTRY";
    pub const READ_TENANT_ASN: &str = "READ:TENANT_ASN";
    pub const CREATE_ASN_REGISTRY: &str = "CREATE:ASN_REGISTRY";
    pub const DELETE_ASN_REGISTRY: &str = "DELETE:ASN_REGISTRY";
    pub const READ_PROTOCOL: &str = "READ:PROTOCOL";
    pub const READ_TENANT_PROTOCOL: &str = "READ:TENANT_PROTOCOL";
    pub const CREATE_PROTOCOL: &str = "CREATE:PROTOCOL";
    pub const DELETE_PROTOCOL: &str = "DELETE:PROTOCOL";
}

fn denied() -> AppError {
    AppError::Forbidden("Access denied".to_string())
}

/// Decide whether `principal` satisfies `requirement` for a request
/// addressing `path_tenant` (the tenant named in the URL, if any).
///
/// The elevated global check always runs first for `Either` so platform
/// operators cross tenant boundaries without tenant-local grants; a
/// tenant principal is additionally pinned to the tenant in its token.
pub async fn authorize<C: PermissionChecker + ?Sized>(
    checker: &C,
    principal: &Principal,
    requirement: PermissionRequirement,
    path_tenant: Option<Uuid>,
) -> Result<()> {
    require_live(checker, principal).await?;
    match requirement {
        PermissionRequirement::Global(code) => match principal {
            Principal::Global { user_id } => {
                if checker.holds_global(*user_id, code).await? {
                    Ok(())
                } else {
                    Err(denied())
                }
            }
            Principal::TenantSession { .. } => Err(denied()),
        },
        PermissionRequirement::Tenant(code) => {
            authorize_tenant_local(checker, principal, code, path_tenant).await
        }
        PermissionRequirement::Either { global, tenant } => match principal {
            Principal::Global { user_id } => {
                if checker.holds_global(*user_id, global).await? {
                    Ok(())
                } else {
                    Err(denied())
                }
            }
            Principal::TenantSession { .. } => {
                authorize_tenant_local(checker, principal, tenant, path_tenant).await
            }
        },
    }
}

/// A valid token whose subject has since been deleted is an
/// authentication failure, never Forbidden and never NotFound.
async fn require_live<C: PermissionChecker + ?Sized>(
    checker: &C,
    principal: &Principal,
) -> Result<()> {
    let live = match principal {
        Principal::Global { user_id } => checker.global_principal_exists(*user_id).await?,
        Principal::TenantSession { tenant_user_id, .. } => {
            checker.tenant_principal_exists(*tenant_user_id).await?
        }
    };
    if live {
        Ok(())
    } else {
        Err(AppError::Unauthorized("User is not authenticated".to_string()))
    }
}

async fn authorize_tenant_local<C: PermissionChecker + ?Sized>(
    checker: &C,
    principal: &Principal,
    code: &'static str,
    path_tenant: Option<Uuid>,
) -> Result<()> {
    let Principal::TenantSession {
        tenant_user_id,
        tenant_id,
    } = principal
    else {
        return Err(denied());
    };

    // A tenant session only ever acts inside the tenant it was minted for.
    if let Some(path_tenant) = path_tenant {
        if *tenant_id != path_tenant {
            return Err(denied());
        }
    }

    if checker.holds_tenant(*tenant_user_id, code).await? {
        Ok(())
    } else {
        Err(denied())
    }
}
