//! Reference-data endpoints
//!
//! ASN registries and protocols are platform-wide catalogs. Tenant
//! consoles read them through tenant-scoped paths behind the either-or
//! gate; creation and deletion are platform-operator operations.

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{AsnRegistry, CreateAsnRegistryInput, CreateProtocolInput, Protocol};
use crate::error::Result;
use crate::middleware::Principal;
use crate::policy::{authorize, codes, PermissionRequirement};
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

pub async fn list_asn_registries(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<AsnRegistry>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_ASN,
            tenant: codes::READ_ASN_REGISTRY,
        },
        Some(tenant_id),
    )
    .await?;
    let registries = state.reference.list_asn_registries().await?;
    Ok(Json(SuccessResponse::new(registries)))
}

pub async fn get_asn_registry(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SuccessResponse<AsnRegistry>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_ASN,
            tenant: codes::READ_ASN_REGISTRY,
        },
        Some(tenant_id),
    )
    .await?;
    let registry = state.reference.get_asn_registry(id).await?;
    Ok(Json(SuccessResponse::new(registry)))
}

pub async fn create_asn_registry(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<CreateAsnRegistryInput>,
) -> Result<(StatusCode, Json<SuccessResponse<AsnRegistry>>)> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::CREATE_ASN_REGISTRY),
        None,
    )
    .await?;
    let registry = state.reference.create_asn_registry(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(registry))))
}

pub async fn delete_asn_registry(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::DELETE_ASN_REGISTRY),
        None,
    )
    .await?;
    state.reference.delete_asn_registry(id).await?;
    Ok(Json(MessageResponse::new("ASN registry deleted")))
}

pub async fn list_protocols(
    State(state): State<AppState>,
    principal: Principal,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<SuccessResponse<Vec<Protocol>>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_PROTOCOL,
            tenant: codes::READ_PROTOCOL,
        },
        Some(tenant_id),
    )
    .await?;
    let protocols = state.reference.list_protocols().await?;
    Ok(Json(SuccessResponse::new(protocols)))
}

pub async fn get_protocol(
    State(state): State<AppState>,
    principal: Principal,
    Path((tenant_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SuccessResponse<Protocol>>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Either {
            global: codes::READ_TENANT_PROTOCOL,
            tenant: codes::READ_PROTOCOL,
        },
        Some(tenant_id),
    )
    .await?;
    let protocol = state.reference.get_protocol(id).await?;
    Ok(Json(SuccessResponse::new(protocol)))
}

pub async fn create_protocol(
    State(state): State<AppState>,
    principal: Principal,
    Json(input): Json<CreateProtocolInput>,
) -> Result<(StatusCode, Json<SuccessResponse<Protocol>>)> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::CREATE_PROTOCOL),
        None,
    )
    .await?;
    let protocol = state.reference.create_protocol(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(protocol))))
}

pub async fn delete_protocol(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::DELETE_PROTOCOL),
        None,
    )
    .await?;
    state.reference.delete_protocol(id).await?;
    Ok(Json(MessageResponse::new("Protocol deleted")))
}
