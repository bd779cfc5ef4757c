//! User repository (global principals)

use crate::domain::User;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    /// Lookup by email or username, whichever matches.
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>>;
    async fn create(
        &self,
        email: Option<String>,
        username: Option<String>,
        password_hash: &str,
    ) -> Result<User>;
    async fn set_suspended(&self, id: Uuid, suspended: bool) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, username, password_hash, is_suspended, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, username, password_hash, is_suspended, created_at, updated_at FROM users WHERE email = ? OR username = ?",
        )
        .bind(identity)
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        email: Option<String>,
        username: Option<String>,
        password_hash: &str,
    ) -> Result<User> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash, is_suspended, created_at, updated_at)
            VALUES (?, ?, ?, ?, FALSE, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn set_suspended(&self, id: Uuid, suspended: bool) -> Result<()> {
        let result =
            sqlx::query("UPDATE users SET is_suspended = ?, updated_at = NOW() WHERE id = ?")
                .bind(suspended)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }
}
