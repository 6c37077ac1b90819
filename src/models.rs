use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// AdminCredential
///
/// Credential record from the `admins` table. The password is only ever held as a bcrypt hash.
#[derive(Debug, Clone, FromRow)]
pub struct AdminCredential {
    pub id: i64,
    // Matched exactly and case-sensitively at login.
    pub username: String,
    pub password_hash: String,
}

/// PersistentToken
///
/// A remember-me credential stored server-side in `admin_remember_tokens`.
/// The raw hex token is also the cookie value, and lookups are by that value.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PersistentToken {
    pub admin_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PersistentToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// SessionPayload
///
/// Decrypted content of the `admin_session` cookie. Both fields are required; a payload
/// missing either one does not deserialize and is treated as an invalid cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub admin_id: i64,
    // Expiry as UNIX epoch seconds.
    pub exp: i64,
}

impl SessionPayload {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp > now.timestamp()
    }
}

/// LoginForm
///
/// Fields submitted by the admin login form (`POST /admin/login`).
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    /// Reads the form from urlencoded fields. `remember` counts as checked for `on`, `1`
    /// or `true`; missing fields read as empty.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let remember_me = fields
            .get("remember")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "on" | "1" | "true"))
            .unwrap_or(false);

        Self {
            username: field("username"),
            password: field("password"),
            remember_me,
        }
    }
}
