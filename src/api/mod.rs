//! HTTP handlers and response envelopes

pub mod auth;
pub mod authz;
pub mod health;
pub mod reference;
pub mod tenant;
pub mod tenant_authz;
pub mod user;

use serde::Serialize;

/// Standard payload envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Envelope for responses that carry no payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a point permission check.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}
