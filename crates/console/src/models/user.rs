use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use miraki_core::{Email, Role, UserId};

/// The signed-in console user, as issued by the server.
///
/// Cached next to the token in the credential store. The role is immutable
/// for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Server-side grant list. Informational only: permission checks use the
    /// static role table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}
