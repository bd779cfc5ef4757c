//! Reference-data domain models (ASN registries, protocols)
//!
//! Administered catalog data referenced by the threat-event store. Deletes
//! are guarded: a registry or protocol with live threat events cannot be
//! removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Autonomous system registry entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AsnRegistry {
    pub id: Uuid,
    pub number: i64,
    pub name: String,
    pub country_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AsnRegistry {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: 0,
            name: String::new(),
            country_code: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Network protocol reference entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Protocol {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Protocol {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: String::new(),
            name: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating an ASN registry entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAsnRegistryInput {
    #[validate(range(min = 0))]
    pub number: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 2, max = 2))]
    pub country_code: Option<String>,
}

/// Input for creating a protocol entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProtocolInput {
    /// Catalog code, e.g. `TCP` or `DNS_OVER_HTTPS`
    #[validate(length(min = 1, max = 50), regex(path = *super::authz::CATALOG_CODE_REGEX))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_create_asn_registry_input_valid() {
        let input = CreateAsnRegistryInput {
            number: 64512,
            name: "Example Transit".to_string(),
            country_code: Some("US".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_asn_registry_input_negative_number() {
        let input = CreateAsnRegistryInput {
            number: -1,
            name: "Bad".to_string(),
            country_code: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_protocol_input_empty_code() {
        let input = CreateProtocolInput {
            code: String::new(),
            name: "Transmission Control Protocol".to_string(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_create_protocol_input_code_shape() {
        let valid = CreateProtocolInput {
            code: "DNS_OVER_HTTPS".to_string(),
            name: "DNS over HTTPS".to_string(),
        };
        assert!(valid.validate().is_ok());

        let lowercase = CreateProtocolInput {
            code: "tcp".to_string(),
            name: "Transmission Control Protocol".to_string(),
        };
        assert!(lowercase.validate().is_err());
    }
}
