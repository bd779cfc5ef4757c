//! Page catalog domain models
//!
//! Pages and page groups are shared infrastructure: one catalog serves
//! both scopes. Only the required-permission edge differs — global pages
//! are gated through `page_permissions`, tenant visibility through
//! `page_tenant_permissions`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Navigable UI page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: Uuid,
    pub code: String,
    pub path: String,
    /// Nullable only transiently; a page without a group is unreachable
    /// and never returned by accessibility queries.
    pub page_group_id: Option<Uuid>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            code: String::new(),
            path: String::new(),
            page_group_id: None,
        }
    }
}

/// Page group (navigation category)
///
/// `pages` is populated by the resolver with only the pages the principal
/// can access, never the full underlying collection.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PageGroup {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub icon: Option<String>,
    #[sqlx(skip)]
    pub pages: Vec<Page>,
}

impl Default for PageGroup {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            code: String::new(),
            name: String::new(),
            icon: None,
            pages: Vec::new(),
        }
    }
}

/// Page requirement edge, global scope. A page may carry several of
/// these; holding any one of the referenced permissions grants access.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PagePermission {
    pub page_id: Uuid,
    pub permission_id: Uuid,
}

/// Page requirement edge, tenant scope
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PageTenantPermission {
    pub page_id: Uuid,
    pub tenant_permission_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_default_is_orphaned() {
        let page = Page::default();
        assert!(page.page_group_id.is_none());
    }

    #[test]
    fn test_page_group_serialization_includes_pages() {
        let group = PageGroup {
            code: "threat-intel".to_string(),
            name: "Threat Intelligence".to_string(),
            pages: vec![Page {
                code: "protocols-list".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&group).unwrap();
        assert!(json.contains("protocols-list"));
    }
}
