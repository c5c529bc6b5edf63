//! Advisory permission checks for the signed-in user.
//!
//! The server enforces authorization; these checks only decide what the
//! console offers. Resolution is a pure function of the role, see
//! [`Role::allows`](miraki_core::Role::allows).

use crate::models::User;

/// Whether `user` holds `permission`.
///
/// No user holds nothing. An admin holds everything, including permission
/// names the role table has never heard of.
#[must_use]
pub fn has_permission(user: Option<&User>, permission: &str) -> bool {
    user.is_some_and(|user| user.role.allows(permission))
}
