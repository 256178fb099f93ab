//! Well-known storage keys used by the auth layer.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application touches.

/// Namespace shared by every auth key.
pub const AUTH_PREFIX: &str = "supabase.auth";

/// Access token key.
pub const ACCESS_TOKEN: &str = "supabase.auth.token";

/// Expiry key (epoch milliseconds).
pub const EXPIRES_AT: &str = "supabase.auth.expires_at";

/// Refresh token key.
pub const REFRESH_TOKEN: &str = "supabase.auth.refresh_token";

/// The three keys making up a session token record.
pub const TOKEN_KEYS: [&str; 3] = [ACCESS_TOKEN, EXPIRES_AT, REFRESH_TOKEN];

/// Whether a key belongs to auth state and must go on invalidation.
///
/// Matches the fixed namespace and the SDK's own `sb-<project>-auth-token`
/// keys.
pub fn is_auth_key(key: &str) -> bool {
    key.starts_with(AUTH_PREFIX) || (key.starts_with("sb-") && key.contains("-auth-token"))
}

/// Cache key for a collaborator GET response.
pub fn response(method: &str, url: &str) -> String {
    format!("{}:{url}", method.to_uppercase())
}
