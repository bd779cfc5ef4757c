//! Domain models for Sentra Core

pub mod authz;
pub mod page;
pub mod reference;
pub mod tenant;
pub mod tenant_authz;
pub mod user;

pub use authz::*;
pub use page::*;
pub use reference::*;
pub use tenant::*;
pub use tenant_authz::*;
pub use user::*;
