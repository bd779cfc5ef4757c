//! Request authentication
//!
//! Extracts the caller's principal from the `Authorization` bearer token.
//! Both token shapes land in the same extractor so any guarded endpoint
//! can accept either kind of caller and let the endpoint gate decide.

use crate::error::AppError;
use crate::jwt::JwtManager;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Global platform user, authenticated by an identity token.
    Global { user_id: Uuid },
    /// Tenant user, authenticated by a session token bound to one tenant.
    TenantSession {
        tenant_user_id: Uuid,
        tenant_id: Uuid,
    },
}

fn unauthenticated() -> AppError {
    AppError::Unauthorized("User is not authenticated".to_string())
}

impl<S> FromRequestParts<S> for Principal
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthenticated)?;
        let token = header.strip_prefix("Bearer ").ok_or_else(unauthenticated)?;

        if let Ok(claims) = jwt.verify_identity_token(token) {
            let user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthenticated())?;
            return Ok(Principal::Global { user_id });
        }

        let claims = jwt
            .verify_tenant_session_token(token)
            .map_err(|_| unauthenticated())?;
        let tenant_user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthenticated())?;
        let tenant_id = Uuid::parse_str(&claims.tenant_id).map_err(|_| unauthenticated())?;
        Ok(Principal::TenantSession {
            tenant_user_id,
            tenant_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn jwt_manager() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(JwtConfig {
            secret: "test-secret-key-for-testing-purposes-only".to_string(),
            issuer: "https://sentra.test".to_string(),
            identity_token_ttl_secs: 3600,
            tenant_token_ttl_secs: 3600,
        }))
    }

    async fn whoami(principal: Principal) -> String {
        match principal {
            Principal::Global { user_id } => format!("global:{}", user_id),
            Principal::TenantSession {
                tenant_user_id,
                tenant_id,
            } => format!("tenant:{}:{}", tenant_id, tenant_user_id),
        }
    }

    fn app(jwt: Arc<JwtManager>) -> Router {
        Router::new().route("/whoami", get(whoami)).with_state(jwt)
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = app(jwt_manager())
            .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_identity_token_yields_global_principal() {
        let jwt = jwt_manager();
        let user_id = Uuid::new_v4();
        let token = jwt.create_identity_token(user_id).unwrap();

        let response = app(jwt.clone())
            .oneshot(
                Request::get("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, format!("global:{}", user_id).as_bytes());
    }

    #[tokio::test]
    async fn test_tenant_token_yields_tenant_principal() {
        let jwt = jwt_manager();
        let tenant_user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let token = jwt
            .create_tenant_session_token(tenant_user_id, tenant_id)
            .unwrap();

        let response = app(jwt.clone())
            .oneshot(
                Request::get("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            body,
            format!("tenant:{}:{}", tenant_id, tenant_user_id).as_bytes()
        );
    }

    #[tokio::test]
    async fn test_forged_token_is_unauthorized() {
        let jwt = jwt_manager();
        let forger = JwtManager::new(JwtConfig {
            secret: "some-other-secret-entirely".to_string(),
            issuer: "https://sentra.test".to_string(),
            identity_token_ttl_secs: 3600,
            tenant_token_ttl_secs: 3600,
        });
        let token = forger.create_identity_token(Uuid::new_v4()).unwrap();

        let response = app(jwt)
            .oneshot(
                Request::get("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let response = app(jwt_manager())
            .oneshot(
                Request::get("/whoami")
                    .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
