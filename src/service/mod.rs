pub mod auth;
pub mod authz;
pub mod reference;
pub mod resolver;
pub mod tenant_authz;

pub use auth::{AuthService, IdentitySession, TenantSession};
pub use authz::AuthzService;
pub use reference::ReferenceService;
pub use tenant_authz::TenantAuthzService;
