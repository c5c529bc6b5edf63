//! Console roles and the role-to-permission table.
//!
//! The table in [`Role::grants`] is the single source of truth for what a
//! non-admin role may do. Admins bypass it entirely. Checks are advisory: the
//! backend enforces the same rules on every request.

use serde::{Deserialize, Serialize};

/// Console user role.
///
/// A role is fixed for the lifetime of a session; changing it requires the
/// user to sign in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted access to every console feature.
    Admin,
    /// Catalog and order management.
    Staff,
    /// Manages only their own artworks.
    Artist,
    /// Read-only access. The backend's legacy `user` role maps here.
    #[serde(alias = "user")]
    Viewer,
}

impl Role {
    /// Every role, in descending order of privilege.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Staff, Self::Artist, Self::Viewer];

    /// Permissions granted by the static table.
    ///
    /// The match is exhaustive, so every role has an entry (possibly empty).
    /// The admin entry lists everything for display purposes only;
    /// [`Role::allows`] never consults it.
    #[must_use]
    pub const fn grants(self) -> &'static [Permission] {
        match self {
            Self::Admin => &Permission::ALL,
            Self::Staff => &[
                Permission::ManageArtworks,
                Permission::ManageArtists,
                Permission::ManageOrders,
            ],
            Self::Artist => &[Permission::ManageOwnArtworks],
            Self::Viewer => &[],
        }
    }

    /// Whether this role may perform `permission`.
    ///
    /// Admin short-circuits to `true` for any token, including ones the table
    /// has never heard of. Other roles must hold the token in their entry.
    #[must_use]
    pub fn allows(self, permission: &str) -> bool {
        if self == Self::Admin {
            return true;
        }
        self.grants().iter().any(|p| p.as_str() == permission)
    }

    /// Wire representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Artist => "artist",
            Self::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "artist" => Ok(Self::Artist),
            "viewer" | "user" => Ok(Self::Viewer),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

/// A capability token gating a console action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageArtworks,
    ManageArtists,
    ManageOrders,
    ManageSettings,
    ManageContent,
    ManageOwnArtworks,
}

impl Permission {
    /// Every known permission.
    pub const ALL: [Self; 7] = [
        Self::ManageUsers,
        Self::ManageArtworks,
        Self::ManageArtists,
        Self::ManageOrders,
        Self::ManageSettings,
        Self::ManageContent,
        Self::ManageOwnArtworks,
    ];

    /// Token string as used by the backend and the UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageUsers => "manage_users",
            Self::ManageArtworks => "manage_artworks",
            Self::ManageArtists => "manage_artists",
            Self::ManageOrders => "manage_orders",
            Self::ManageSettings => "manage_settings",
            Self::ManageContent => "manage_content",
            Self::ManageOwnArtworks => "manage_own_artworks",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_admin_roles_match_table_membership() {
        for role in [Role::Staff, Role::Artist, Role::Viewer] {
            for permission in Permission::ALL {
                assert_eq!(
                    role.allows(permission.as_str()),
                    role.grants().contains(&permission),
                    "{role} / {permission}"
                );
            }
            assert!(!role.allows("anything"));
        }
    }

    #[test]
    fn test_admin_allows_everything() {
        for permission in Permission::ALL {
            assert!(Role::Admin.allows(permission.as_str()));
        }
        assert!(Role::Admin.allows("anything"));
        assert!(Role::Admin.allows(""));
    }

    #[test]
    fn test_staff_grants() {
        assert!(Role::Staff.allows("manage_artworks"));
        assert!(Role::Staff.allows("manage_orders"));
        assert!(!Role::Staff.allows("manage_users"));
        assert!(!Role::Staff.allows("manage_settings"));
    }

    #[test]
    fn test_artist_and_viewer_grants() {
        assert!(Role::Artist.allows("manage_own_artworks"));
        assert!(!Role::Artist.allows("manage_artworks"));
        assert!(Role::Viewer.grants().is_empty());
    }

    #[test]
    fn test_role_serde_accepts_legacy_user() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::Viewer);
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"viewer\"");
    }

    #[test]
    fn test_role_from_str_round_trips_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
