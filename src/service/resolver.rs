//! Graph-walking permission resolution
//!
//! The same staged walk serves both authorization scopes: principal →
//! roles → role-permission grants → permission rows, then onward to the
//! pages those permissions unlock. The walk is written once against
//! [`ScopeStore`] and instantiated by the global and tenant repositories.

use crate::domain::{Action, Page, PageGroup, Resource};
use crate::error::Result;
use crate::repository::{ScopeStore, ScopedPermission};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Resolve the full deduplicated permission set a principal holds through
/// its roles, with resource and action catalog records attached where the
/// catalog still has a matching code.
///
/// A principal with no roles resolves to an empty set; that is a valid
/// outcome, not an error.
pub async fn resolve_permissions<S: ScopeStore>(
    store: &S,
    principal_id: Uuid,
) -> Result<Vec<S::Permission>> {
    let role_ids = store.find_role_ids_for_principal(principal_id).await?;
    if role_ids.is_empty() {
        return Ok(vec![]);
    }

    // Overlapping roles grant overlapping permissions; collapse before
    // fetching rows so each permission appears exactly once.
    let permission_ids: Vec<Uuid> = store
        .find_permission_ids_for_roles(&role_ids)
        .await?
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut permissions = store.find_permissions_by_ids(&permission_ids).await?;

    let resource_codes: Vec<String> = permissions
        .iter()
        .map(|p| p.resource_code().to_owned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let action_codes: Vec<String> = permissions
        .iter()
        .map(|p| p.action_code().to_owned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let resources: HashMap<String, Resource> = store
        .find_resources_by_codes(&resource_codes)
        .await?
        .into_iter()
        .map(|r| (r.code.clone(), r))
        .collect();
    let actions: HashMap<String, Action> = store
        .find_actions_by_codes(&action_codes)
        .await?
        .into_iter()
        .map(|a| (a.code.clone(), a))
        .collect();

    // Soft join: a permission whose catalog entry vanished keeps flowing
    // through resolution with the detail left unset.
    for permission in &mut permissions {
        let resource = resources.get(permission.resource_code()).cloned();
        let action = actions.get(permission.action_code()).cloned();
        permission.attach_catalog(resource, action);
    }

    Ok(permissions)
}

/// Resolve the page groups a principal can reach, each carrying only the
/// pages the principal's permissions unlock.
///
/// Page access is a union: one matching permission suffices, however many
/// permissions gate the page. Pages without a parent group are excluded
/// outright, and a group never appears without at least one accessible
/// page.
pub async fn resolve_accessible_pages<S: ScopeStore>(
    store: &S,
    principal_id: Uuid,
) -> Result<Vec<PageGroup>> {
    let role_ids = store.find_role_ids_for_principal(principal_id).await?;
    if role_ids.is_empty() {
        return Ok(vec![]);
    }

    let permission_ids: Vec<Uuid> = store
        .find_permission_ids_for_roles(&role_ids)
        .await?
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if permission_ids.is_empty() {
        return Ok(vec![]);
    }

    let page_ids: Vec<Uuid> = store
        .find_page_ids_for_permissions(&permission_ids)
        .await?
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let pages = store.find_pages_by_ids(&page_ids).await?;

    // Ungrouped pages have no place in the navigation tree.
    let grouped: Vec<Page> = pages
        .into_iter()
        .filter(|p| p.page_group_id.is_some())
        .collect();

    let group_ids: Vec<Uuid> = grouped
        .iter()
        .filter_map(|p| p.page_group_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut groups = store.find_page_groups_by_ids(&group_ids).await?;

    let mut by_group: HashMap<Uuid, Vec<Page>> = HashMap::new();
    for page in grouped {
        if let Some(group_id) = page.page_group_id {
            by_group.entry(group_id).or_default().push(page);
        }
    }

    for group in &mut groups {
        group.pages = by_group.remove(&group.id).unwrap_or_default();
    }
    groups.retain(|g| !g.pages.is_empty());

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Permission;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Store {}

        #[async_trait]
        impl ScopeStore for Store {
            type Permission = Permission;

            async fn find_role_ids_for_principal(&self, principal_id: Uuid) -> Result<Vec<Uuid>>;
            async fn find_permission_ids_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>>;
            async fn find_permissions_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Permission>>;
            async fn find_resources_by_codes(&self, codes: &[String]) -> Result<Vec<Resource>>;
            async fn find_actions_by_codes(&self, codes: &[String]) -> Result<Vec<Action>>;
            async fn find_page_ids_for_permissions(&self, permission_ids: &[Uuid]) -> Result<Vec<Uuid>>;
            async fn find_pages_by_ids(&self, page_ids: &[Uuid]) -> Result<Vec<Page>>;
            async fn find_page_groups_by_ids(&self, group_ids: &[Uuid]) -> Result<Vec<PageGroup>>;
            async fn holds_permission(
                &self,
                principal_id: Uuid,
                action: &str,
                resource: &str,
            ) -> Result<bool>;
        }
    }

    fn permission(id: Uuid, action: &str, resource: &str) -> Permission {
        Permission {
            id,
            resource_code: resource.to_string(),
            action_code: action.to_string(),
            ..Default::default()
        }
    }

    fn page(id: Uuid, code: &str, group_id: Option<Uuid>) -> Page {
        Page {
            id,
            code: code.to_string(),
            path: format!("/{}", code.to_lowercase()),
            page_group_id: group_id,
        }
    }

    fn page_group(id: Uuid, code: &str) -> PageGroup {
        PageGroup {
            id,
            code: code.to_string(),
            name: code.to_string(),
            icon: None,
            pages: vec![],
        }
    }

    #[tokio::test]
    async fn test_resolve_permissions_no_roles_yields_empty_set() {
        let user_id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(vec![]));
        // No further lookups run once the role list is empty.
        store.expect_find_permission_ids_for_roles().times(0);

        let result = resolve_permissions(&store, user_id).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_permissions_dedupes_across_roles() {
        let user_id = Uuid::new_v4();
        let perm_id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .returning(|_| Ok(vec![Uuid::new_v4(), Uuid::new_v4()]));
        // Both roles grant the same permission.
        store
            .expect_find_permission_ids_for_roles()
            .returning(move |_| Ok(vec![perm_id, perm_id]));
        store
            .expect_find_permissions_by_ids()
            .withf(move |ids| ids.len() == 1 && ids[0] == perm_id)
            .returning(move |_| Ok(vec![permission(perm_id, "READ", "THREAT_EVENT")]));
        store
            .expect_find_resources_by_codes()
            .returning(|_| Ok(vec![]));
        store
            .expect_find_actions_by_codes()
            .returning(|_| Ok(vec![]));

        let result = resolve_permissions(&store, user_id).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].code(), "READ:THREAT_EVENT");
    }

    #[tokio::test]
    async fn test_resolve_permissions_soft_joins_catalog() {
        let user_id = Uuid::new_v4();
        let known = Uuid::new_v4();
        let dangling = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        store
            .expect_find_permission_ids_for_roles()
            .returning(move |_| Ok(vec![known, dangling]));
        store.expect_find_permissions_by_ids().returning(move |_| {
            Ok(vec![
                permission(known, "READ", "THREAT_EVENT"),
                permission(dangling, "READ", "RETIRED_RESOURCE"),
            ])
        });
        store.expect_find_resources_by_codes().returning(|_| {
            Ok(vec![Resource {
                code: "THREAT_EVENT".to_string(),
                name: "Threat events".to_string(),
                description: None,
            }])
        });
        store.expect_find_actions_by_codes().returning(|_| {
            Ok(vec![Action {
                code: "READ".to_string(),
                name: "Read".to_string(),
            }])
        });

        let result = resolve_permissions(&store, user_id).await.unwrap();
        assert_eq!(result.len(), 2);

        let resolved = result.iter().find(|p| p.id == known).unwrap();
        assert_eq!(resolved.resource.as_ref().unwrap().code, "THREAT_EVENT");
        assert_eq!(resolved.action.as_ref().unwrap().code, "READ");

        // Dangling catalog reference resolves with detail unset, not an error.
        let orphaned = result.iter().find(|p| p.id == dangling).unwrap();
        assert!(orphaned.resource.is_none());
        assert_eq!(orphaned.action.as_ref().unwrap().code, "READ");
    }

    #[tokio::test]
    async fn test_resolve_pages_excludes_ungrouped_pages() {
        let user_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let grouped_page = page(Uuid::new_v4(), "EVENTS", Some(group_id));
        let orphan_page = page(Uuid::new_v4(), "LEGACY", None);

        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        store
            .expect_find_permission_ids_for_roles()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        store
            .expect_find_page_ids_for_permissions()
            .returning(|_| Ok(vec![Uuid::new_v4(), Uuid::new_v4()]));
        let pages = vec![grouped_page.clone(), orphan_page];
        store
            .expect_find_pages_by_ids()
            .returning(move |_| Ok(pages.clone()));
        store
            .expect_find_page_groups_by_ids()
            .withf(move |ids| ids == [group_id])
            .returning(move |_| Ok(vec![page_group(group_id, "MONITORING")]));

        let result = resolve_accessible_pages(&store, user_id).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pages.len(), 1);
        assert_eq!(result[0].pages[0].code, "EVENTS");
    }

    #[tokio::test]
    async fn test_resolve_pages_union_of_gating_permissions() {
        let user_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let page_id = Uuid::new_v4();
        let shared = page(page_id, "DASHBOARD", Some(group_id));

        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        store
            .expect_find_permission_ids_for_roles()
            .returning(|_| Ok(vec![Uuid::new_v4(), Uuid::new_v4()]));
        // Two gating permissions both point at the same page.
        store
            .expect_find_page_ids_for_permissions()
            .returning(move |_| Ok(vec![page_id, page_id]));
        store
            .expect_find_pages_by_ids()
            .withf(move |ids| ids == [page_id])
            .returning(move |_| Ok(vec![shared.clone()]));
        store
            .expect_find_page_groups_by_ids()
            .returning(move |_| Ok(vec![page_group(group_id, "OVERVIEW")]));

        let result = resolve_accessible_pages(&store, user_id).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pages.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_pages_no_permissions_short_circuits() {
        let user_id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_find_role_ids_for_principal()
            .returning(|_| Ok(vec![Uuid::new_v4()]));
        store
            .expect_find_permission_ids_for_roles()
            .returning(|_| Ok(vec![]));
        store.expect_find_page_ids_for_permissions().times(0);

        let result = resolve_accessible_pages(&store, user_id).await.unwrap();
        assert!(result.is_empty());
    }
}
