//! GoTrue request and response bodies.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use gch_entity::identity::ExternalIdentity;
use gch_entity::session::{AuthSession, SessionTokenRecord};

/// Lifetime assumed when the server omits both expiry fields.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// Body of a successful `/token` call.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Epoch seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: ExternalIdentity,
}

impl TokenResponse {
    fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            })
    }

    pub fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self.expiry(now);
        AuthSession {
            record: SessionTokenRecord::new(self.access_token, expires_at, self.refresh_token),
            user: self.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(extra: &str) -> String {
        format!(
            r#"{{"access_token":"abc","token_type":"bearer","refresh_token":"ref",{extra}
               "user":{{"id":"00000000-0000-0000-0000-000000000001","email":"ana@gch.com"}}}}"#
        )
    }

    #[test]
    fn test_expires_at_wins() {
        let token: TokenResponse =
            serde_json::from_str(&body(r#""expires_in":3600,"expires_at":1800000000,"#)).unwrap();
        let session = token.into_session(Utc::now());
        assert_eq!(session.record.expires_at_millis(), 1_800_000_000_000);
        assert_eq!(session.user.email.as_deref(), Some("ana@gch.com"));
    }

    #[test]
    fn test_expires_in_fallback() {
        let now = Utc::now();
        let token: TokenResponse = serde_json::from_str(&body(r#""expires_in":60,"#)).unwrap();
        assert_eq!(token.into_session(now).record.expires_at, now + Duration::seconds(60));
    }
}
