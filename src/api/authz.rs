//! Global-scope authorization endpoints

use crate::api::{CheckResponse, MessageResponse, SuccessResponse};
use crate::domain::{
    CreateRoleInput, PageGroup, Permission, ReplaceUserRolesInput, Role, RoleWithPermissions,
    UpdateRoleInput,
};
use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::policy::{authorize, codes, PermissionRequirement};
use crate::repository::UserRepository;
use crate::server::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

/// The global console only serves global principals.
fn require_global(principal: &Principal) -> Result<Uuid> {
    match principal {
        Principal::Global { user_id } => Ok(*user_id),
        Principal::TenantSession { .. } => {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }
}

/// A token can outlive its subject; a vanished principal is treated as
/// unauthenticated, never as a missing resource.
async fn require_live_user(state: &AppState, user_id: Uuid) -> Result<()> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User is not authenticated".to_string()))?;
    Ok(())
}

pub async fn my_permissions(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SuccessResponse<Vec<Permission>>>> {
    let user_id = require_global(&principal)?;
    require_live_user(&state, user_id).await?;
    let permissions = state.authz.get_user_permissions(user_id).await?;
    Ok(Json(SuccessResponse::new(permissions)))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub code: String,
}

pub async fn check_my_permission(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<CheckQuery>,
) -> Result<Json<SuccessResponse<CheckResponse>>> {
    let user_id = require_global(&principal)?;
    require_live_user(&state, user_id).await?;
    let allowed = state.authz.check_permission(user_id, &query.code).await?;
    Ok(Json(SuccessResponse::new(CheckResponse { allowed })))
}

pub async fn my_pages(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SuccessResponse<Vec<PageGroup>>>> {
    let user_id = require_global(&principal)?;
    require_live_user(&state, user_id).await?;
    let groups = state.authz.get_accessible_pages(user_id).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SuccessResponse<Vec<Permission>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_PERMISSION),
        None,
    )
    .await?;
    let permissions = state.authz.list_permissions().await?;
    Ok(Json(SuccessResponse::new(permissions)))
}

pub async fn create_role(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<CreateRoleInput>,
) -> Result<(StatusCode, Json<SuccessResponse<Role>>)> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::CREATE_ROLE),
        None,
    )
    .await?;
    let role = state.authz.create_role(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(role))))
}

pub async fn list_roles(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SuccessResponse<Vec<Role>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_ROLE),
        None,
    )
    .await?;
    let roles = state.authz.list_roles().await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn get_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<RoleWithPermissions>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_ROLE),
        None,
    )
    .await?;
    let role = state.authz.get_role(id).await?;
    Ok(Json(SuccessResponse::new(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateRoleInput>,
) -> Result<Json<SuccessResponse<Role>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_ROLE),
        None,
    )
    .await?;
    let role = state.authz.update_role(id, input).await?;
    Ok(Json(SuccessResponse::new(role)))
}

pub async fn delete_role(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::DELETE_ROLE),
        None,
    )
    .await?;
    state.authz.delete_role(id).await?;
    Ok(Json(MessageResponse::new("Role deleted")))
}

pub async fn assign_permission(
    State(state): State<AppState>,
    principal: Principal,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_ROLE),
        None,
    )
    .await?;
    state
        .authz
        .assign_permission_to_role(role_id, permission_id)
        .await?;
    Ok(Json(MessageResponse::new("Permission assigned")))
}

pub async fn remove_permission(
    State(state): State<AppState>,
    principal: Principal,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_ROLE),
        None,
    )
    .await?;
    state
        .authz
        .remove_permission_from_role(role_id, permission_id)
        .await?;
    Ok(Json(MessageResponse::new("Permission removed")))
}

pub async fn get_user_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<Role>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_USER_ROLE),
        None,
    )
    .await?;
    let roles = state.authz.get_user_roles(user_id).await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn put_user_roles(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ReplaceUserRolesInput>,
) -> Result<Json<SuccessResponse<Vec<Role>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_USER_ROLE),
        None,
    )
    .await?;
    let roles = state.authz.replace_user_roles(user_id, input).await?;
    Ok(Json(SuccessResponse::new(roles)))
}

pub async fn delete_user_role(
    State(state): State<AppState>,
    principal: Principal,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_USER_ROLE),
        None,
    )
    .await?;
    state.authz.remove_user_role(user_id, role_id).await?;
    Ok(Json(MessageResponse::new("Role unassigned")))
}
