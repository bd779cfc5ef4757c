//! JWT token handling
//!
//! Two token shapes are issued: identity tokens for global platform users
//! and tenant session tokens for tenant-scoped users. Suspension is
//! enforced at issuance time (see `service::auth`); the gate trusts the
//! claims of a verified token verbatim.

use crate::config::JwtConfig;
use crate::error::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const AUDIENCE: &str = "sentra-console";

/// Identity token claims (global platform user session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator (prevents token confusion attacks)
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Tenant session token claims (tenant-scoped user session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSessionClaims {
    /// Subject (tenant user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator (prevents token confusion attacks)
    #[serde(default)]
    pub token_type: String,
    /// Tenant this session is bound to
    pub tenant_id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create a Validation with a strict leeway (5 seconds) instead of the
    /// default 60 seconds, so tokens expire promptly while tolerating minor
    /// clock skew.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_audience(&[AUDIENCE]);
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Create an identity token for a global user
    pub fn create_identity_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.identity_token_ttl_secs);

        let claims = IdentityClaims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            aud: AUDIENCE.to_string(),
            token_type: "identity".to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Create a session token for a tenant user
    pub fn create_tenant_session_token(
        &self,
        tenant_user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.tenant_token_ttl_secs);

        let claims = TenantSessionClaims {
            sub: tenant_user_id.to_string(),
            iss: self.config.issuer.clone(),
            aud: AUDIENCE.to_string(),
            token_type: "tenant_session".to_string(),
            tenant_id: tenant_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify and decode an identity token
    pub fn verify_identity_token(&self, token: &str) -> Result<IdentityClaims> {
        let token_data =
            decode::<IdentityClaims>(token, &self.decoding_key, &self.strict_validation())?;
        if token_data.claims.token_type != "identity" {
            return Err(crate::error::AppError::Unauthorized(
                "Invalid token type".to_string(),
            ));
        }
        Ok(token_data.claims)
    }

    /// Verify and decode a tenant session token
    pub fn verify_tenant_session_token(&self, token: &str) -> Result<TenantSessionClaims> {
        let token_data =
            decode::<TenantSessionClaims>(token, &self.decoding_key, &self.strict_validation())?;
        if token_data.claims.token_type != "tenant_session" {
            return Err(crate::error::AppError::Unauthorized(
                "Invalid token type".to_string(),
            ));
        }
        Ok(token_data.claims)
    }
}
