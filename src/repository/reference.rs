//! Reference-data repository (ASN registries, protocols)

use crate::domain::{AsnRegistry, CreateAsnRegistryInput, CreateProtocolInput, Protocol};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    async fn list_asn_registries(&self) -> Result<Vec<AsnRegistry>>;
    async fn find_asn_registry_by_id(&self, id: Uuid) -> Result<Option<AsnRegistry>>;
    async fn create_asn_registry(&self, input: &CreateAsnRegistryInput) -> Result<AsnRegistry>;
    /// Fails with `Conflict` while any threat event still references the registry.
    async fn delete_asn_registry(&self, id: Uuid) -> Result<()>;

    async fn list_protocols(&self) -> Result<Vec<Protocol>>;
    async fn find_protocol_by_id(&self, id: Uuid) -> Result<Option<Protocol>>;
    async fn create_protocol(&self, input: &CreateProtocolInput) -> Result<Protocol>;
    /// Fails with `Conflict` while any threat event still references the protocol.
    async fn delete_protocol(&self, id: Uuid) -> Result<()>;
}

pub struct ReferenceRepositoryImpl {
    pool: MySqlPool,
}

impl ReferenceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for ReferenceRepositoryImpl {
    async fn list_asn_registries(&self) -> Result<Vec<AsnRegistry>> {
        let registries = sqlx::query_as::<_, AsnRegistry>(
            "SELECT id, number, name, country_code, created_at, updated_at FROM asn_registries ORDER BY number",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(registries)
    }

    async fn find_asn_registry_by_id(&self, id: Uuid) -> Result<Option<AsnRegistry>> {
        let registry = sqlx::query_as::<_, AsnRegistry>(
            "SELECT id, number, name, country_code, created_at, updated_at FROM asn_registries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(registry)
    }

    async fn create_asn_registry(&self, input: &CreateAsnRegistryInput) -> Result<AsnRegistry> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO asn_registries (id, number, name, country_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(input.number)
        .bind(&input.name)
        .bind(&input.country_code)
        .execute(&self.pool)
        .await?;

        self.find_asn_registry_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create ASN registry")))
    }

    async fn delete_asn_registry(&self, id: Uuid) -> Result<()> {
        let references: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM threat_events WHERE asn_registry_id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if references > 0 {
            return Err(AppError::Conflict(format!(
                "ASN registry is referenced by {} threat event(s)",
                references
            )));
        }

        let result = sqlx::query("DELETE FROM asn_registries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("ASN registry {} not found", id)));
        }
        Ok(())
    }

    async fn list_protocols(&self) -> Result<Vec<Protocol>> {
        let protocols = sqlx::query_as::<_, Protocol>(
            "SELECT id, code, name, created_at, updated_at FROM protocols ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(protocols)
    }

    async fn find_protocol_by_id(&self, id: Uuid) -> Result<Option<Protocol>> {
        let protocol = sqlx::query_as::<_, Protocol>(
            "SELECT id, code, name, created_at, updated_at FROM protocols WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(protocol)
    }

    async fn create_protocol(&self, input: &CreateProtocolInput) -> Result<Protocol> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO protocols (id, code, name, created_at, updated_at)
            VALUES (?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.code)
        .bind(&input.name)
        .execute(&self.pool)
        .await?;

        self.find_protocol_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create protocol")))
    }

    async fn delete_protocol(&self, id: Uuid) -> Result<()> {
        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM threat_events WHERE protocol_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Protocol is referenced by {} threat event(s)",
                references
            )));
        }

        let result = sqlx::query("DELETE FROM protocols WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Protocol {} not found", id)));
        }
        Ok(())
    }
}
