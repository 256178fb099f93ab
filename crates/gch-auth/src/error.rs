//! Structured authentication errors.

use gch_core::error::{AppError, ErrorKind};

/// Message shown when valid credentials belong to a non-admin.
pub const NOT_AUTHORIZED_MESSAGE: &str = "Access denied. You are not authorized as an admin.";

/// Why an authentication operation did not produce a back-office identity.
///
/// Callers branch on the variant instead of parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The identity collaborator could not be reached or failed unexpectedly.
    #[error("Failed to check authentication status")]
    Network(String),

    /// The collaborator rejected the credentials; carries its message verbatim.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Credentials were valid but no active admin profile exists.
    #[error("{}", NOT_AUTHORIZED_MESSAGE)]
    NotAuthorized,

    /// The cached session was stale and has been cleared.
    #[error("Cached session is stale")]
    StaleCache,

    /// Another state-changing operation is already in flight.
    #[error("Another authentication operation is already in progress")]
    Busy,

    /// Anything else.
    #[error("Unexpected authentication error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Classify a failure of the sign-in call itself.
    pub fn from_sign_in(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Authentication | ErrorKind::Validation => {
                Self::InvalidCredentials(err.message)
            }
            _ if err.is_unreachable() => Self::Network(err.message),
            _ => Self::Unknown(err.message),
        }
    }

    /// Classify a failure while resolving the current session.
    ///
    /// Every collaborator failure here surfaces as [`AuthError::Network`].
    pub fn from_resolution(err: AppError) -> Self {
        Self::Network(err.to_string())
    }

    /// The matching application error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::ServiceUnavailable,
            Self::InvalidCredentials(_) => ErrorKind::Authentication,
            Self::NotAuthorized => ErrorKind::Authorization,
            Self::StaleCache => ErrorKind::Session,
            Self::Busy => ErrorKind::Conflict,
            Self::Unknown(_) => ErrorKind::Internal,
        }
    }

    /// Underlying detail for logs, when the display message hides it.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Network(detail) | Self::Unknown(detail) => Some(detail),
            _ => None,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_authorized_message_is_exact() {
        assert_eq!(
            AuthError::NotAuthorized.to_string(),
            "Access denied. You are not authorized as an admin."
        );
    }

    #[test]
    fn test_credentials_error_is_verbatim() {
        let err = AuthError::from_sign_in(AppError::authentication("Invalid login credentials"));
        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_unreachable_sign_in_is_network() {
        let err = AuthError::from_sign_in(AppError::service_unavailable("connection refused"));
        assert_eq!(err, AuthError::Network("connection refused".to_string()));
        assert_eq!(err.to_string(), "Failed to check authentication status");
    }

    #[test]
    fn test_resolution_errors_are_network() {
        let err = AuthError::from_resolution(AppError::internal("boom"));
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(err.detail(), Some("INTERNAL: boom"));
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = AuthError::Busy.into();
        assert_eq!(app.kind, ErrorKind::Conflict);
    }
}
