//! Staleness detection for cached session tokens.
//!
//! A cached session counts as stale when the token or expiry is missing, or
//! when the expiry falls within the look-ahead window of now (inclusive).

use chrono::{DateTime, Duration, Utc};

use gch_entity::session::{RecordPresence, SessionTokenRecord};

/// Default look-ahead window: five minutes.
pub const DEFAULT_WINDOW_MS: i64 = 300_000;

/// Pure staleness check on raw values in epoch milliseconds.
///
/// `stale` iff the token is missing or empty, the expiry is missing, or
/// `expires_at_ms <= now_ms + 300_000`.
pub fn is_stale(token: Option<&str>, expires_at_ms: Option<i64>, now_ms: i64) -> bool {
    let has_token = token.is_some_and(|t| !t.is_empty());
    match (has_token, expires_at_ms) {
        (true, Some(expires)) => expires <= now_ms.saturating_add(DEFAULT_WINDOW_MS),
        _ => true,
    }
}

/// Staleness detector with a configurable look-ahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessDetector {
    window: Duration,
}

impl StalenessDetector {
    /// Create a detector with a window in milliseconds.
    pub fn new(window_ms: i64) -> Self {
        Self {
            window: Duration::milliseconds(window_ms.max(0)),
        }
    }

    /// The look-ahead window in milliseconds.
    pub fn window_ms(&self) -> i64 {
        self.window.num_milliseconds()
    }

    /// Evaluate token presence and expiry at `now`.
    pub fn is_stale(
        &self,
        has_token: bool,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match (has_token, expires_at) {
            (true, Some(expires_at)) => expires_at <= now + self.window,
            _ => true,
        }
    }

    /// Evaluate a complete record, or its absence.
    pub fn is_record_stale(&self, record: Option<&SessionTokenRecord>, now: DateTime<Utc>) -> bool {
        match record {
            Some(record) => self.is_stale(!record.access_token.is_empty(), Some(record.expires_at), now),
            None => true,
        }
    }

    /// Evaluate whatever storage holds. Partial records are always stale.
    pub fn is_presence_stale(&self, presence: &RecordPresence, now: DateTime<Utc>) -> bool {
        self.is_record_stale(presence.record(), now)
    }
}

impl Default for StalenessDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}
