use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Cookie lifetime used when the auth service reports no `expires_in`.
pub const DEFAULT_MAX_AGE_SECS: i64 = 3600;

/// A signed-in session as issued by the auth service.
///
/// Sessions are never edited field by field: every login, signup or explicit
/// assignment swaps in a complete new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub user: User,
}

impl Session {
    /// Lifetime in seconds for the persisted cookies.
    pub fn max_age_secs(&self) -> i64 {
        if self.expires_in > 0 {
            self.expires_in
        } else {
            DEFAULT_MAX_AGE_SECS
        }
    }

    /// Absolute expiry reported by the server, if any (unix seconds).
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }

    /// Informational only. Nothing refreshes or rejects an expired session.
    pub fn is_expired(&self) -> bool {
        self.expires_at_utc()
            .map(|expiry| Utc::now() > expiry)
            .unwrap_or(false)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at_utc()
            .map(|expiry| (expiry - Utc::now()).num_minutes().max(0))
    }
}
