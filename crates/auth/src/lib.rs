//! `loandesk-auth`: pure authorization boundary.
//!
//! Roles arrive with each request as an explicit [`Principal`]; nothing here
//! reads ambient state. Authentication and role storage belong to the host.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
