//! Session token record and its presence states.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Access token, expiry instant and refresh token, always together.
///
/// A record is either entirely present or absent. Storage that holds only
/// some of the three values is represented by [`RecordPresence::Partial`]
/// and must be cleared.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokenRecord {
    /// Opaque bearer credential.
    pub access_token: String,
    /// Instant at which the access token stops being valid.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    /// Credential used to obtain a fresh access token.
    pub refresh_token: String,
}

impl SessionTokenRecord {
    /// Create a new record.
    pub fn new(
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            refresh_token: refresh_token.into(),
        }
    }

    /// Expiry as epoch milliseconds, the format used in storage.
    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at.timestamp_millis()
    }

    /// Parse a stored expiry value (epoch milliseconds).
    ///
    /// Returns `None` for empty or malformed values.
    pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
        let millis = raw.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Whether the access token has already expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for SessionTokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenRecord")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// What storage actually holds for the session token keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPresence {
    /// All three values are present and the expiry parses.
    Complete(SessionTokenRecord),
    /// Some values are present but not a full record.
    Partial {
        /// Whether an access token value exists.
        has_token: bool,
        /// Whether a parseable expiry value exists.
        has_expiry: bool,
        /// Whether a refresh token value exists.
        has_refresh: bool,
    },
    /// Nothing is stored.
    Absent,
}

impl RecordPresence {
    /// Classify raw stored values. Empty strings count as missing.
    pub fn from_parts(
        token: Option<String>,
        expires_at: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        let token = token.filter(|t| !t.is_empty());
        let raw_expiry_present = expires_at.as_deref().is_some_and(|e| !e.is_empty());
        let expiry = expires_at
            .as_deref()
            .and_then(SessionTokenRecord::parse_expiry);
        let refresh_token = refresh_token.filter(|t| !t.is_empty());

        match (token, expiry, refresh_token) {
            (Some(access_token), Some(expires_at), Some(refresh_token)) => {
                Self::Complete(SessionTokenRecord {
                    access_token,
                    expires_at,
                    refresh_token,
                })
            }
            (None, None, None) if !raw_expiry_present => Self::Absent,
            (token, expiry, refresh) => Self::Partial {
                has_token: token.is_some(),
                has_expiry: expiry.is_some(),
                has_refresh: refresh.is_some(),
            },
        }
    }

    /// The complete record, if any.
    pub fn record(&self) -> Option<&SessionTokenRecord> {
        match self {
            Self::Complete(record) => Some(record),
            _ => None,
        }
    }

    /// Whether anything at all is stored.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
