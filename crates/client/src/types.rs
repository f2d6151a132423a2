//! Wire and domain types shared across the client.
//!
//! Field names follow the backend's JSON contract, which uses camelCase
//! for `userName` and uppercase role names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role. The backend only ever issues these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Student,
    Teacher,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "STUDENT"),
            UserRole::Teacher => write!(f, "TEACHER"),
        }
    }
}

/// Identity record the backend returns at login and profile update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub role: UserRole,
    /// Server-side path or URL of the profile image, when one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Login request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration request body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Successful login response: a token plus the user fields at the same level.
///
/// `token` stays optional here so a malformed server response surfaces as a
/// missing-token failure instead of a deserialization error.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub user: UserRecord,
}

impl LoginPayload {
    /// The issued token, if present and non-blank.
    pub fn issued_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
