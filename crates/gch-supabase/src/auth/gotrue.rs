//! Identity provider over the GoTrue REST API.
//!
//! Holds the current session in memory. When the in-memory session is empty
//! it restores the mirrored token record through the storage probe, so a
//! restarted process keeps its sign-in. Expired or rejected access tokens are
//! refreshed once with the refresh token.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use gch_auth::provider::{AuthChangeEvent, IdentityProvider};
use gch_cache::probe::StorageProbe;
use gch_core::result::AppResult;
use gch_entity::identity::ExternalIdentity;
use gch_entity::session::{AuthSession, SessionTokenRecord};

use crate::client::{self, SupabaseClient};

use super::wire::{PasswordGrant, RefreshGrant, TokenResponse};

const EVENT_CAPACITY: usize = 64;

/// GoTrue-backed [`IdentityProvider`].
#[derive(Debug)]
pub struct GoTrueIdentityProvider {
    client: SupabaseClient,
    session: RwLock<Option<AuthSession>>,
    probe: Option<StorageProbe>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl GoTrueIdentityProvider {
    /// Create a provider with no session restore.
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            probe: None,
            events,
        }
    }

    /// Restore sessions from the mirrored token record.
    pub fn with_probe(mut self, probe: StorageProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// The in-memory session's access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.record.access_token.clone())
    }

    fn emit(&self, event: AuthChangeEvent) {
        let _ = self.events.send(event);
    }

    async fn store(&self, session: Option<AuthSession>) {
        *self.session.write().await = session;
    }

    /// The record to resolve from: memory first, then the mirror.
    async fn known_record(&self) -> Option<SessionTokenRecord> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Some(session.record.clone());
        }

        let probe = self.probe.as_ref()?;
        match probe.read_record().await {
            Ok(record) => {
                if record.is_some() {
                    debug!("Restoring session from mirrored token record");
                }
                record
            }
            Err(e) => {
                warn!(error = %e, "Cannot read mirrored token record");
                None
            }
        }
    }

    async fn fetch_user(&self, access_token: &str) -> AppResult<Result<ExternalIdentity, StatusCode>> {
        let request = self
            .client
            .request(Method::GET, &self.client.auth_endpoint("user"))
            .bearer_auth(access_token);
        let response = self.client.send(request).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(Err(response.status())),
            _ => {
                let response = client::check(response).await?;
                let user = response
                    .json::<ExternalIdentity>()
                    .await
                    .map_err(client::transport_error)?;
                Ok(Ok(user))
            }
        }
    }

    /// Exchange a refresh token. `Ok(None)` means the server rejected it and
    /// the session is gone.
    async fn refresh(&self, refresh_token: &str) -> AppResult<Option<AuthSession>> {
        let request = self
            .client
            .request(
                Method::POST,
                &self.client.auth_endpoint("token?grant_type=refresh_token"),
            )
            .json(&RefreshGrant { refresh_token });
        let response = self.client.send(request).await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            info!(status = status.as_u16(), "Refresh token rejected, session ended");
            let had_session = self.session.write().await.take().is_some();
            if had_session || self.probe.is_some() {
                self.emit(AuthChangeEvent::SignedOut);
            }
            return Ok(None);
        }

        let token = client::check(response)
            .await?
            .json::<TokenResponse>()
            .await
            .map_err(client::transport_error)?;
        let session = token.into_session(Utc::now());
        self.store(Some(session.clone())).await;

        info!(user_id = %session.user.id, expires_at = %session.record.expires_at, "Access token refreshed");
        self.emit(AuthChangeEvent::TokenRefreshed(session.record.clone()));
        Ok(Some(session))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let request = self
            .client
            .request(
                Method::POST,
                &self.client.auth_endpoint("token?grant_type=password"),
            )
            .json(&PasswordGrant { email, password });
        let response = client::check(self.client.send(request).await?).await?;

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(client::transport_error)?;
        let session = token.into_session(Utc::now());
        self.store(Some(session.clone())).await;

        debug!(user_id = %session.user.id, "GoTrue password sign-in succeeded");
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        let taken = self.session.write().await.take();
        let record = match taken {
            Some(session) => session.record,
            // Not resolved in this process; revoke the mirrored session instead.
            None => match self.known_record().await {
                Some(record) => record,
                None => {
                    debug!("No session to sign out");
                    return Ok(());
                }
            },
        };

        let request = self
            .client
            .request(Method::POST, &self.client.auth_endpoint("logout"))
            .bearer_auth(&record.access_token);
        let result = match self.client.send(request).await {
            // An already-invalid token means the server-side session is gone too.
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND
                ) =>
            {
                Ok(())
            }
            Ok(response) => client::check(response).await.map(|_| ()),
            Err(e) => Err(e),
        };

        self.emit(AuthChangeEvent::SignedOut);
        result
    }

    async fn get_current_session(&self) -> AppResult<Option<AuthSession>> {
        let Some(record) = self.known_record().await else {
            return Ok(None);
        };

        if record.is_expired_at(Utc::now()) {
            debug!("Access token expired, refreshing");
            return self.refresh(&record.refresh_token).await;
        }

        match self.fetch_user(&record.access_token).await? {
            Ok(user) => {
                let session = AuthSession { record, user };
                self.store(Some(session.clone())).await;
                Ok(Some(session))
            }
            Err(status) => {
                debug!(status = status.as_u16(), "Access token rejected, refreshing");
                self.refresh(&record.refresh_token).await
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}
