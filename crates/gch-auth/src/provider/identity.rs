//! Identity collaborator trait.

use async_trait::async_trait;
use tokio::sync::broadcast;

use gch_core::result::AppResult;
use gch_entity::identity::ExternalIdentity;
use gch_entity::session::{AuthSession, SessionTokenRecord};

/// Auth-state changes pushed by the identity collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChangeEvent {
    /// A session was established.
    SignedIn(AuthSession),
    /// The session ended, locally or elsewhere.
    SignedOut,
    /// The access token was refreshed.
    TokenRefreshed(SessionTokenRecord),
    /// Identity metadata changed.
    UserUpdated(ExternalIdentity),
}

impl AuthChangeEvent {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::UserUpdated(_) => "USER_UPDATED",
        }
    }
}

/// The external authentication service.
///
/// Errors of kind `Authentication` or `Validation` from
/// [`sign_in_with_password`](IdentityProvider::sign_in_with_password) mean the
/// credentials were rejected and the message is shown to the user as-is.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    /// End the current session with the collaborator.
    async fn sign_out(&self) -> AppResult<()>;

    /// The collaborator's view of the current session, if any.
    async fn get_current_session(&self) -> AppResult<Option<AuthSession>>;

    /// Subscribe to auth-state change events.
    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent>;
}
