use crate::model::common::Role;

/// A set of roles allowed through an [`AuthToken`](super::AuthToken) guard.
pub trait RoleSet: Send + Sync + 'static {
    fn permits(role: Role) -> bool;
}

/// Any logged-in user.
pub struct AnyRole;

/// Students only.
pub struct Student;

/// Hostel management only.
pub struct Management;

impl RoleSet for AnyRole {
    fn permits(_role: Role) -> bool {
        true
    }
}

impl RoleSet for Student {
    fn permits(role: Role) -> bool {
        role == Role::Student
    }
}

impl RoleSet for Management {
    fn permits(role: Role) -> bool {
        role == Role::Management
    }
}
