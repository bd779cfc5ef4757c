//! Tenant-scope authorization endpoints
//!
//! Every route here carries a tenant in its path. Reads and writes are
//! gated either-or: a platform operator holding the elevated cross-tenant
//! code passes for any tenant, a tenant principal passes only inside the
//! tenant its session is bound to.

use crate::api::{CheckResponse, MessageResponse, SuccessResponse};
use crate::domain::{
    CreateTenantRoleInput, PageGroup, ReplaceTenantUserRolesInput, TenantPermission, TenantRole,
    TenantRoleWithPermissions, UpdateTenantRoleInput,
};
use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::policy::{authorize, codes, PermissionRequirement};
use crate::repository::TenantRepository;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

/// The tenant console serves only the tenant principal of the path tenant.
fn require_tenant_member(principal: &Principal, path_tenant: Uuid) -> Result<Uuid> {
    match principal {
        Principal::TenantSession {
            tenant_user_id,
            tenant_id,
        } if *tenant_id == path_tenant => Ok(*tenant_user_id),
        _ => Err(AppError::Forbidden("Access denied".to_string())),
    }
}

async fn require_live_tenant_user(state: &AppState, tenant_user_id: Uuid) -> Result<()> {
    state
        .tenants
        .find_tenant_user_by_id(tenant_user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User is not authenticated".to_string()))?;
    Ok(())
}

pub async fn my_permissions(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<TenantPermission>>>> {
    let tenant_user_id = require_tenant_member(&principal, tenant_id)?;
    require_live_tenant_user(&state, tenant_user_id).await?;
    let permissions = state
        .tenant_authz
        .get_tenant_user_permissions(tenant_user_id)
        .await?;
    Ok(Json(SuccessResponse::new(permissions)))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub code: String,
}

pub async fn check_my_permission(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<SuccessResponse<CheckResponse>>> {
    let tenant_user_id = require_tenant_member(&principal, tenant_id)?;
    require_live_tenant_user(&state, tenant_user_id).await?;
    let allowed = state
        .tenant_authz
        .check_permission(tenant_user_id, &query.code)
        .await?;
    Ok(Json(SuccessResponse::new(CheckResponse { allowed })))
}

pub async fn my_pages(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<PageGroup>>>> {
    let tenant_user_id = require_tenant_member(&principal, tenant_id)?;
    require_live_tenant_user(&state, tenant_user_id).await?;
    let groups = state
        .tenant_authz
        .get_accessible_pages(tenant_user_id)
        .await?;
    Ok(Json(SuccessResponse::new(groups)))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<TenantPermission>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_PERMISSION,
            tenant: codes::READ_PERMISSION,
        },
        Some(tenant_id),
    )
    .await?;
    let permissions = state.tenant_authz.list_permissions().await?;
    Ok(Json(SuccessResponse::new(permissions)))
}

/// Role payload; the owning tenant comes from the path.
#[derive(Debug, Deserialize)]
pub struct TenantRoleBody {
    pub name: String,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<Uuid>>,
}

pub async fn create_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
    Json(body): Json<TenantRoleBody>,
) -> Result<(StatusCode, Json<SuccessResponse<TenantRole>>)> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::CREATE_TENANT_ROLE,
            tenant: codes::CREATE_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let role = state
        .tenant_authz
        .create_role(CreateTenantRoleInput {
            tenant_id,
            name: body.name,
            description: body.description,
            permission_ids: body.permission_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(role))))
}

pub async fn list_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<TenantRole>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_ROLE,
            tenant: codes::READ_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let roles = state.tenant_authz.list_roles(tenant_id).await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn get_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SuccessResponse<TenantRoleWithPermissions>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_ROLE,
            tenant: codes::READ_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let role = state.tenant_authz.get_role(tenant_id, id).await?;
    Ok(Json(SuccessResponse::new(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateTenantRoleInput>,
) -> Result<Json<SuccessResponse<TenantRole>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::UPDATE_TENANT_ROLE,
            tenant: codes::UPDATE_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let role = state.tenant_authz.update_role(tenant_id, id, input).await?;
    Ok(Json(SuccessResponse::new(role)))
}

pub async fn delete_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::DELETE_TENANT_ROLE,
            tenant: codes::DELETE_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    state.tenant_authz.delete_role(tenant_id, id).await?;
    Ok(Json(MessageResponse::new("Role deleted")))
}

pub async fn assign_permission(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, role_id, permission_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::UPDATE_TENANT_ROLE,
            tenant: codes::UPDATE_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    state
        .tenant_authz
        .assign_permission_to_role(tenant_id, role_id, permission_id)
        .await?;
    Ok(Json(MessageResponse::new("Permission assigned")))
}

pub async fn remove_permission(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, role_id, permission_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::UPDATE_TENANT_ROLE,
            tenant: codes::UPDATE_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    state
        .tenant_authz
        .remove_permission_from_role(tenant_id, role_id, permission_id)
        .await?;
    Ok(Json(MessageResponse::new("Permission removed")))
}

pub async fn get_user_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, tenant_user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SuccessResponse<Vec<TenantRole>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_USER_ROLE,
            tenant: codes::READ_USER_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let roles = state
        .tenant_authz
        .get_user_roles(tenant_id, tenant_user_id)
        .await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn put_user_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, tenant_user_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ReplaceTenantUserRolesInput>,
) -> Result<Json<SuccessResponse<Vec<TenantRole>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::UPDATE_TENANT_USER_ROLE,
            tenant: codes::UPDATE_USER_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    let roles = state
        .tenant_authz
        .replace_user_roles(tenant_id, tenant_user_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn delete_user_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, tenant_user_id, role_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::UPDATE_TENANT_USER_ROLE,
            tenant: codes::UPDATE_USER_ROLE,
        },
        Some(tenant_id),
    )
    .await?;
    state
        .tenant_authz
        .remove_user_role(tenant_id, tenant_user_id, role_id)
        .await?;
    Ok(Json(MessageResponse::new("Role unassigned")))
}
