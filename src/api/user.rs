//! User administration endpoints (platform scope)

use crate::api::MessageResponse;
use crate::error::Result;
use crate::middleware::Principal;
use crate::policy::{authorize, codes, PermissionRequirement};
use crate::repository::UserRepository;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SuspensionBody {
    pub suspended: bool,
}

/// Suspension takes effect at the next token issuance; tokens already in
/// flight stay valid until they expire.
pub async fn set_suspension(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<Uuid>,
    Json(body): Json<SuspensionBody>,
) -> Result<Json<MessageResponse>> {
    authorize(
        state.gate.as_ref(),
        &principal,
        PermissionRequirement::Global(codes::UPDATE_USER),
        None,
    )
    .await?;
    state.users.set_suspended(user_id, body.suspended).await?;
    tracing::info!(%user_id, suspended = body.suspended, "Updated user suspension");
    Ok(Json(MessageResponse::new("Suspension updated")))
}
