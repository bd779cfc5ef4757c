//! Tenant and tenant-user repository

use crate::domain::{CreateTenantInput, Tenant, TenantUser};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, input: &CreateTenantInput) -> Result<Tenant>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>>;
    async fn list(&self) -> Result<Vec<Tenant>>;

    async fn find_tenant_user_by_id(&self, id: Uuid) -> Result<Option<TenantUser>>;
    /// Lookup by email or username within one tenant's namespace.
    async fn find_tenant_user_by_identity(
        &self,
        tenant_id: Uuid,
        identity: &str,
    ) -> Result<Option<TenantUser>>;
}

pub struct TenantRepositoryImpl {
    pool: MySqlPool,
}

impl TenantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for TenantRepositoryImpl {
    async fn create(&self, input: &CreateTenantInput) -> Result<Tenant> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create tenant")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, description, created_at, updated_at FROM tenants WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn list(&self) -> Result<Vec<Tenant>> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, name, description, created_at, updated_at FROM tenants",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    async fn find_tenant_user_by_id(&self, id: Uuid) -> Result<Option<TenantUser>> {
        let tenant_user = sqlx::query_as::<_, TenantUser>(
            r#"
            SELECT id, tenant_id, email, username, password_hash, is_tenant_admin, is_suspended, created_at, updated_at
            FROM tenant_users WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant_user)
    }

    async fn find_tenant_user_by_identity(
        &self,
        tenant_id: Uuid,
        identity: &str,
    ) -> Result<Option<TenantUser>> {
        let tenant_user = sqlx::query_as::<_, TenantUser>(
            r#"
            SELECT id, tenant_id, email, username, password_hash, is_tenant_admin, is_suspended, created_at, updated_at
            FROM tenant_users
            WHERE tenant_id = ? AND (email = ? OR username = ?)
            "#,
        )
        .bind(tenant_id)
        .bind(identity)
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant_user)
    }
}
