//! Scope-lookup seam for the authorization resolver
//!
//! Global and tenant authorization are two structurally parallel but
//! type-distinct hierarchies. The resolution algorithm is written once
//! (see `service::resolver`) against this trait and instantiated per
//! scope by the two repository implementations, keeping the scopes
//! separated at the type level without duplicating the algorithm.

use crate::domain::{Action, Page, PageGroup, Permission, Resource, TenantPermission};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// Split a wholesale role replacement into `(removals, additions)`.
/// Roles present on both sides are untouched, so their assignment rows
/// keep their identity across the replacement.
pub fn assignment_diff(existing: &[Uuid], requested: &[Uuid]) -> (Vec<Uuid>, Vec<Uuid>) {
    let existing: HashSet<Uuid> = existing.iter().copied().collect();
    let requested: HashSet<Uuid> = requested.iter().copied().collect();
    let removals = existing.difference(&requested).copied().collect();
    let additions = requested.difference(&existing).copied().collect();
    (removals, additions)
}

/// A permission entity as seen by the resolver, independent of scope.
pub trait ScopedPermission: Clone + Send + Sync {
    fn resource_code(&self) -> &str;
    fn action_code(&self) -> &str;
    /// Attach the denormalized catalog records looked up by code.
    /// `None` means the catalog entry was renamed or removed; resolution
    /// carries on regardless.
    fn attach_catalog(&mut self, resource: Option<Resource>, action: Option<Action>);
}

impl ScopedPermission for Permission {
    fn resource_code(&self) -> &str {
        &self.resource_code
    }

    fn action_code(&self) -> &str {
        &self.action_code
    }

    fn attach_catalog(&mut self, resource: Option<Resource>, action: Option<Action>) {
        self.resource = resource;
        self.action = action;
    }
}

impl ScopedPermission for TenantPermission {
    fn resource_code(&self) -> &str {
        &self.resource_code
    }

    fn action_code(&self) -> &str {
        &self.action_code
    }

    fn attach_catalog(&mut self, resource: Option<Resource>, action: Option<Action>) {
        self.resource = resource;
        self.action = action;
    }
}

/// The staged lookups one resolution runs through, in dependency order:
/// role assignments → role-permission grants → permission rows → page
/// edges → pages → page groups. Every method is a bounded, read-only
/// point lookup; a failure here is an infrastructure error, never an
/// authorization decision.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    type Permission: ScopedPermission + 'static;

    /// Role IDs assigned to the principal. Empty result is valid data.
    async fn find_role_ids_for_principal(&self, principal_id: Uuid) -> Result<Vec<Uuid>>;

    /// Permission IDs granted through any of the given roles.
    async fn find_permission_ids_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<Uuid>>;

    /// Permission rows for the given IDs.
    async fn find_permissions_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Self::Permission>>;

    /// Resource catalog rows matching any of the given codes (soft join).
    async fn find_resources_by_codes(&self, codes: &[String]) -> Result<Vec<Resource>>;

    /// Action catalog rows matching any of the given codes (soft join).
    async fn find_actions_by_codes(&self, codes: &[String]) -> Result<Vec<Action>>;

    /// Page IDs gated by any of the given permissions (union semantics).
    async fn find_page_ids_for_permissions(&self, permission_ids: &[Uuid]) -> Result<Vec<Uuid>>;

    /// Page rows for the given IDs.
    async fn find_pages_by_ids(&self, page_ids: &[Uuid]) -> Result<Vec<Page>>;

    /// Page group rows for the given IDs.
    async fn find_page_groups_by_ids(&self, group_ids: &[Uuid]) -> Result<Vec<PageGroup>>;

    /// Point probe: does the principal hold `action:resource` through any
    /// role? Used by the endpoint gate.
    async fn holds_permission(
        &self,
        principal_id: Uuid,
        action: &str,
        resource: &str,
    ) -> Result<bool>;
}
