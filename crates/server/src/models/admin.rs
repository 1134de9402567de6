//! Admin accounts stored in `admins.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bagworks_core::{AdminRole, Email};

use super::CurrentAdmin;
use crate::store::Record;

/// An admin account managed with `bw-cli`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    /// Login email, unique across accounts.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Permission level.
    #[serde(default)]
    pub role: AdminRole,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl AdminAccount {
    /// Identity stored in the session after login.
    #[must_use]
    pub fn to_current(&self) -> CurrentAdmin {
        CurrentAdmin {
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl std::fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccount")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Record for AdminAccount {
    fn record_id(&self) -> &str {
        self.email.as_str()
    }
}
