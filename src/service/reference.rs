//! Reference-data service (ASN registries, protocols)

use crate::domain::{AsnRegistry, CreateAsnRegistryInput, CreateProtocolInput, Protocol};
use crate::error::{AppError, Result};
use crate::repository::ReferenceRepository;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct ReferenceService<R: ReferenceRepository> {
    repository: Arc<R>,
}

impl<R: ReferenceRepository> ReferenceService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub async fn list_asn_registries(&self) -> Result<Vec<AsnRegistry>> {
        self.repository.list_asn_registries().await
    }

    pub async fn get_asn_registry(&self, id: Uuid) -> Result<AsnRegistry> {
        self.repository
            .find_asn_registry_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("ASN registry {} not found", id)))
    }

    pub async fn create_asn_registry(&self, input: CreateAsnRegistryInput) -> Result<AsnRegistry> {
        input.validate()?;
        self.repository.create_asn_registry(&input).await
    }

    pub async fn delete_asn_registry(&self, id: Uuid) -> Result<()> {
        self.repository.delete_asn_registry(id).await
    }

    pub async fn list_protocols(&self) -> Result<Vec<Protocol>> {
        self.repository.list_protocols().await
    }

    pub async fn get_protocol(&self, id: Uuid) -> Result<Protocol> {
        self.repository
            .find_protocol_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Protocol {} not found", id)))
    }

    pub async fn create_protocol(&self, input: CreateProtocolInput) -> Result<Protocol> {
        input.validate()?;
        self.repository.create_protocol(&input).await
    }

    pub async fn delete_protocol(&self, id: Uuid) -> Result<()> {
        self.repository.delete_protocol(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::reference::MockReferenceRepository;

    #[tokio::test]
    async fn test_get_asn_registry_not_found() {
        let mut repo = MockReferenceRepository::new();
        repo.expect_find_asn_registry_by_id().returning(|_| Ok(None));

        let service = ReferenceService::new(Arc::new(repo));
        let result = service.get_asn_registry(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_protocol_conflict_propagates() {
        let mut repo = MockReferenceRepository::new();
        repo.expect_delete_protocol()
            .returning(|_| Err(AppError::Conflict("Protocol is referenced".to_string())));

        let service = ReferenceService::new(Arc::new(repo));
        let result = service.delete_protocol(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
