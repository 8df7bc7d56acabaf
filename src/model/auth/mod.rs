//! Bearer token authentication and role checks.

mod claims;
mod roles;
mod token;

pub use claims::Claims;
pub use roles::{AnyRole, Management, RoleSet, Student};
pub use token::{AuthToken, AUTHORIZATION_HEADER, BEARER_PREFIX};
