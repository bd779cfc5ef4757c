//! User domain model (global platform principals)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Global platform user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    /// At least one of email/username is non-empty
    pub email: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: None,
            username: None,
            password_hash: String::new(),
            is_suspended: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl User {
    /// The identifier shown in logs and error messages
    pub fn display_identity(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("<unknown>")
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 100))]
    pub username: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

impl CreateUserInput {
    /// Email and username are individually optional but one must be present
    pub fn has_identity(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
            || self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Credentials for a global login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, max = 255))]
    pub identity: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_user_default() {
        let user = User::default();
        assert!(!user.id.is_nil());
        assert!(!user.is_suspended);
        assert_eq!(user.display_identity(), "<unknown>");
    }

    #[test]
    fn test_display_identity_prefers_email() {
        let user = User {
            email: Some("analyst@example.com".to_string()),
            username: Some("analyst".to_string()),
            ..Default::default()
        };
        assert_eq!(user.display_identity(), "analyst@example.com");
    }

    #[test]
    fn test_create_user_input_requires_identity() {
        let input = CreateUserInput {
            email: None,
            username: None,
            password: "correct-horse".to_string(),
        };
        assert!(input.validate().is_ok());
        assert!(!input.has_identity());

        let input = CreateUserInput {
            email: None,
            username: Some("analyst".to_string()),
            password: "correct-horse".to_string(),
        };
        assert!(input.has_identity());
    }

    #[test]
    fn test_create_user_input_rejects_bad_email() {
        let input = CreateUserInput {
            email: Some("not-an-email".to_string()),
            username: None,
            password: "correct-horse".to_string(),
        };
        assert!(input.validate().is_err());
    }
}
