//! Tenant administration endpoints (platform scope)

use crate::api::SuccessResponse;
use crate::domain::{CreateTenantInput, Tenant};
use crate::error::{AppError, Result};
use crate::middleware::Principal;
use crate::policy::{authorize, codes, PermissionRequirement};
use crate::repository::TenantRepository;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

pub async fn create_tenant(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<CreateTenantInput>,
) -> Result<(StatusCode, Json<SuccessResponse<Tenant>>)> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::CREATE_TENANT),
        None,
    )
    .await?;
    input.validate()?;
    let tenant = state.tenants.create(&input).await?;
    tracing::info!(tenant_id = %tenant.id, "Created tenant");
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(tenant))))
}

pub async fn list_tenants(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<SuccessResponse<Vec<Tenant>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_TENANT),
        None,
    )
    .await?;
    let tenants = state.tenants.list().await?;
    Ok(Json(SuccessResponse::new(tenants)))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Tenant>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::READ_TENANT),
        None,
    )
    .await?;
    let tenant = state
        .tenants
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))?;
    Ok(Json(SuccessResponse::new(tenant)))
}
