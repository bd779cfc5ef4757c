//! Authentication endpoints

use crate::api::SuccessResponse;
use crate::domain::{CreateUserInput, LoginInput, TenantLoginInput, User};
use crate::error::Result;
use crate::server::AppState;
use crate::service::{IdentitySession, TenantSession};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<SuccessResponse<User>>)> {
    let user = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<SuccessResponse<IdentitySession>>> {
    let session = state.auth.login(input).await?;
    Ok(Json(SuccessResponse::new(session)))
}

/// Body of a tenant login request; the tenant comes from the path.
#[derive(Debug, Deserialize)]
pub struct TenantLoginBody {
    pub identity: String,
    pub password: String,
}

pub async fn tenant_login(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Json(body): Json<TenantLoginBody>,
) -> Result<Json<SuccessResponse<TenantSession>>> {
    let session = state
        .auth
        .tenant_login(TenantLoginInput {
            tenant_id,
            identity: body.identity,
            password: body.password,
        })
        .await?;
    Ok(Json(SuccessResponse::new(session)))
}
