//! Users as returned by `/auth/current` and the user administration endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use freightdesk_core::{Entity, EntityId, IdRef};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A back-office user together with all roles assigned to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Set when an administrator blocked the account.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub blocked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    /// First active role, if any.
    pub fn active_role(&self) -> Option<&Role> {
        self.roles.iter().find(|r| r.active)
    }

    /// Active roles only; inactive roles never grant anything.
    pub fn active_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(|r| r.active)
    }

    /// Display name, falling back to the login when the profile has none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.username.as_deref().unwrap_or(&self.login)
        } else {
            &self.name
        }
    }
}

impl Entity for User {
    fn id(&self) -> Option<EntityId> {
        self.id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Login form body for `POST /public/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth` (user creation).
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub username: String,
    pub password: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub blocked: Option<DateTime<Utc>>,
    pub roles: Vec<IdRef>,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/password`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

impl core::fmt::Debug for UpdatePassword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("UpdatePassword { .. }")
    }
}

/// Accepts RFC 3339, offset-less `LocalDateTime` text (read as UTC), a bare
/// date, or epoch milliseconds.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    let parsed = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Raw::Millis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(Raw::Text(text)) => parse_timestamp(text.trim()),
    };
    parsed
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("unrecognized timestamp"))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
