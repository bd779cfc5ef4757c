//! Authentication and token issuance

use crate::domain::{CreateUserInput, LoginInput, TenantLoginInput, TenantUser, User};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::{TenantRepository, UserRepository};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct IdentitySession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct TenantSession {
    pub token: String,
    pub tenant_user: TenantUser,
}

pub struct AuthService<U: UserRepository, T: TenantRepository> {
    users: Arc<U>,
    tenants: Arc<T>,
    jwt: Arc<JwtManager>,
}

impl<U: UserRepository, T: TenantRepository> AuthService<U, T> {
    pub fn new(users: Arc<U>, tenants: Arc<T>, jwt: Arc<JwtManager>) -> Self {
        Self { users, tenants, jwt }
    }

    pub async fn register(&self, input: CreateUserInput) -> Result<User> {
        input.validate()?;
        if !input.has_identity() {
            return Err(AppError::BadRequest(
                "Either email or username is required".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .users
            .create(input.email, input.username, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Authenticate a global principal and mint an identity token.
    /// A suspended account never reaches token issuance.
    pub async fn login(&self, input: LoginInput) -> Result<IdentitySession> {
        let user = self
            .users
            .find_by_identity(&input.identity)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        verify_password(&input.password, &user.password_hash)?;

        if user.is_suspended {
            tracing::warn!(user_id = %user.id, "Login refused for suspended user");
            return Err(AppError::Unauthorized("Account is suspended".to_string()));
        }

        let token = self.jwt.create_identity_token(user.id)?;
        tracing::info!(user_id = %user.id, identity = %user.display_identity(), "User logged in");
        Ok(IdentitySession { token, user })
    }

    /// Authenticate a tenant principal against its tenant's namespace and
    /// mint a tenant session token bound to that tenant.
    pub async fn tenant_login(&self, input: TenantLoginInput) -> Result<TenantSession> {
        self.tenants
            .find_by_id(input.tenant_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        let tenant_user = self
            .tenants
            .find_tenant_user_by_identity(input.tenant_id, &input.identity)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

        verify_password(&input.password, &tenant_user.password_hash)?;

        if tenant_user.is_suspended {
            tracing::warn!(
                tenant_user_id = %tenant_user.id,
                tenant_id = %tenant_user.tenant_id,
                "Login refused for suspended tenant user"
            );
            return Err(AppError::Unauthorized("Account is suspended".to_string()));
        }

        let token = self
            .jwt
            .create_tenant_session_token(tenant_user.id, tenant_user.tenant_id)?;
        tracing::info!(
            tenant_user_id = %tenant_user.id,
            tenant_id = %tenant_user.tenant_id,
            "Tenant user logged in"
        );
        Ok(TenantSession { token, tenant_user })
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::repository::tenant::MockTenantRepository;
    use crate::repository::user::MockUserRepository;
    use crate::domain::Tenant;
    use uuid::Uuid;

    fn jwt_manager() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(JwtConfig {
            secret: "test-secret-test-secret-test-secret".to_string(),
            issuer: "https://sentra.test".to_string(),
            identity_token_ttl_secs: 3600,
            tenant_token_ttl_secs: 3600,
        }))
    }

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: Some("analyst@example.com".to_string()),
            password_hash: hash_password(password).unwrap(),
            ..Default::default()
        }
    }

    fn tenant_user_with_password(tenant_id: Uuid, password: &str) -> TenantUser {
        TenantUser {
            id: Uuid::new_v4(),
            tenant_id,
            email: Some("operator@example.com".to_string()),
            password_hash: hash_password(password).unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_persists_identity_with_hashed_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_create()
            .withf(|email, username, hash| {
                email.as_deref() == Some("analyst@example.com")
                    && username.is_none()
                    && hash != "hunter2hunter2"
            })
            .times(1)
            .returning(|email, username, hash| {
                Ok(User {
                    email,
                    username,
                    password_hash: hash.to_string(),
                    ..Default::default()
                })
            });
        let tenants = MockTenantRepository::new();

        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt_manager());
        let user = service
            .register(CreateUserInput {
                email: Some("analyst@example.com".to_string()),
                username: None,
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.email.as_deref(), Some("analyst@example.com"));
        verify_password("hunter2hunter2", &user.password_hash).unwrap();
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let user = user_with_password("hunter2hunter2");
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_identity()
            .returning(move |_| Ok(Some(user.clone())));
        let tenants = MockTenantRepository::new();

        let jwt = jwt_manager();
        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt.clone());
        let session = service
            .login(LoginInput {
                identity: "analyst@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();

        let claims = jwt.verify_identity_token(&session.token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = user_with_password("correct-password");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_identity()
            .returning(move |_| Ok(Some(user.clone())));
        let tenants = MockTenantRepository::new();

        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt_manager());
        let result = service
            .login(LoginInput {
                identity: "analyst@example.com".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_identity() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_identity().returning(|_| Ok(None));
        let tenants = MockTenantRepository::new();

        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt_manager());
        let result = service
            .login(LoginInput {
                identity: "nobody@example.com".to_string(),
                password: "whatever-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_suspended_user_gets_no_token() {
        let mut user = user_with_password("hunter2hunter2");
        user.is_suspended = true;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_identity()
            .returning(move |_| Ok(Some(user.clone())));
        let tenants = MockTenantRepository::new();

        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt_manager());
        let result = service
            .login(LoginInput {
                identity: "analyst@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_tenant_login_binds_token_to_tenant() {
        let tenant_id = Uuid::new_v4();
        let tenant_user = tenant_user_with_password(tenant_id, "hunter2hunter2");
        let tenant_user_id = tenant_user.id;

        let users = MockUserRepository::new();
        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |id| {
            Ok(Some(Tenant {
                id,
                ..Default::default()
            }))
        });
        tenants
            .expect_find_tenant_user_by_identity()
            .returning(move |_, _| Ok(Some(tenant_user.clone())));

        let jwt = jwt_manager();
        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt.clone());
        let session = service
            .tenant_login(TenantLoginInput {
                tenant_id,
                identity: "operator@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .unwrap();

        let claims = jwt.verify_tenant_session_token(&session.token).unwrap();
        assert_eq!(claims.sub, tenant_user_id.to_string());
        assert_eq!(claims.tenant_id, tenant_id.to_string());
    }

    #[tokio::test]
    async fn test_tenant_login_suspended_tenant_user_refused() {
        let tenant_id = Uuid::new_v4();
        let mut tenant_user = tenant_user_with_password(tenant_id, "hunter2hunter2");
        tenant_user.is_suspended = true;

        let users = MockUserRepository::new();
        let mut tenants = MockTenantRepository::new();
        tenants.expect_find_by_id().returning(move |id| {
            Ok(Some(Tenant {
                id,
                ..Default::default()
            }))
        });
        tenants
            .expect_find_tenant_user_by_identity()
            .returning(move |_, _| Ok(Some(tenant_user.clone())));

        let service = AuthService::new(Arc::new(users), Arc::new(tenants), jwt_manager());
        let result = service
            .tenant_login(TenantLoginInput {
                tenant_id,
                identity: "operator@example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
