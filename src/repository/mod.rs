pub mod authz;
pub mod reference;
pub mod scope;
pub mod tenant;
pub mod tenant_authz;
pub mod user;

pub use authz::{AuthzRepository, AuthzRepositoryImpl};
pub use reference::{ReferenceRepository, ReferenceRepositoryImpl};
pub use scope::{ScopeStore, ScopedPermission};
pub use tenant::{TenantRepository, TenantRepositoryImpl};
pub use tenant_authz::{TenantAuthzRepository, TenantAuthzRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};
