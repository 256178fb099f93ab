//! Session coordinator: sign-in, sign-out and current-user resolution.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{MutexGuard, watch};
use tracing::{debug, info, warn};

use gch_cache::probe::StorageProbe;
use gch_cache::provider::StorageManager;
use gch_core::config::session::SessionConfig;
use gch_core::traits::page::PageContext;
use gch_entity::identity::ResolvedIdentity;
use gch_entity::session::{AuthSession, RecordPresence, SessionTokenRecord};

use crate::diagnostics::CacheDiagnostics;
use crate::error::AuthError;
use crate::gate::AdminGate;
use crate::invalidator::{CacheInvalidator, InvalidationReport, ReloadPolicy};
use crate::provider::{AdminProfileStore, AuthChangeEvent, IdentityProvider};
use crate::staleness::StalenessDetector;

use super::listeners::{ListenerRegistry, Subscription};
use super::state::SessionState;

/// Owns the session state machine.
///
/// Only one state-changing operation runs at a time; a second one started
/// while the first is in flight fails with [`AuthError::Busy`].
pub struct SessionCoordinator {
    /// Identity collaborator.
    identity: Arc<dyn IdentityProvider>,
    /// Admin authorization gate.
    gate: AdminGate,
    /// Mirrored token record access.
    probe: StorageProbe,
    /// Clears auth state.
    invalidator: CacheInvalidator,
    /// Staleness look-ahead.
    staleness: StalenessDetector,
    /// Current state and its observers.
    listeners: ListenerRegistry,
    /// Error from the most recent state-changing operation.
    last_error: Mutex<Option<AuthError>>,
    /// Number of sessions torn down because the cache went stale.
    stale_evictions: AtomicU64,
    /// Single-flight guard.
    flight: tokio::sync::Mutex<()>,
    /// Set while `follow_auth_events` runs.
    following: AtomicBool,
    /// Receiver subscribed when the last state-changing operation ended.
    ///
    /// Everything queued on the event loop's older receiver predates that
    /// operation and is discarded in favour of this one.
    fresh_events: Mutex<Option<broadcast::Receiver<AuthChangeEvent>>>,
}

/// Holds the single-flight guard for one state-changing operation.
///
/// On drop, before the guard is released, the event loop is handed a receiver
/// that only sees events emitted after the operation.
struct Flight<'a> {
    coordinator: &'a SessionCoordinator,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.coordinator.fence_events();
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &self.state().name())
            .field("staleness", &self.staleness)
            .finish()
    }
}

impl SessionCoordinator {
    /// Create a coordinator in the `Unresolved` state.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        admin_store: Arc<dyn AdminProfileStore>,
        probe: StorageProbe,
        invalidator: CacheInvalidator,
        staleness: StalenessDetector,
    ) -> Self {
        Self {
            identity,
            gate: AdminGate::new(admin_store),
            probe,
            invalidator,
            staleness,
            listeners: ListenerRegistry::new(SessionState::Unresolved),
            last_error: Mutex::new(None),
            stale_evictions: AtomicU64::new(0),
            flight: tokio::sync::Mutex::new(()),
            following: AtomicBool::new(false),
            fresh_events: Mutex::new(None),
        }
    }

    /// Wire a coordinator over the storage manager's stores and caches.
    pub fn with_storage(
        identity: Arc<dyn IdentityProvider>,
        admin_store: Arc<dyn AdminProfileStore>,
        storage: &StorageManager,
        page: Arc<dyn PageContext>,
        config: &SessionConfig,
    ) -> Self {
        let probe = storage.probe();
        let invalidator = CacheInvalidator::new(
            probe.clone(),
            storage.response_caches(),
            page,
            config.login_path.clone(),
        );
        Self::new(
            identity,
            admin_store,
            probe,
            invalidator,
            StalenessDetector::new(config.staleness_window_ms),
        )
    }

    // ── Observation ──────────────────────────────────────────────

    /// The current state.
    pub fn state(&self) -> SessionState {
        self.listeners.current()
    }

    /// The signed-in identity, if any.
    pub fn current_identity(&self) -> Option<ResolvedIdentity> {
        self.state().identity().cloned()
    }

    /// Error retained from the most recent state-changing operation.
    pub fn last_error(&self) -> Option<AuthError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sessions torn down by the scheduled staleness check so far.
    pub fn stale_evictions(&self) -> u64 {
        self.stale_evictions.load(Ordering::Relaxed)
    }

    /// Register a callback; it is replayed the current state immediately.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// A `watch` receiver over the state.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.listeners.watch()
    }

    /// Snapshot of the auth cache and coordinator state.
    pub async fn diagnostics(&self) -> CacheDiagnostics {
        CacheDiagnostics::collect(&self.probe, &self.staleness, Utc::now())
            .await
            .with_session(
                &self.state(),
                self.last_error().as_ref(),
                self.stale_evictions(),
            )
    }

    // ── State-changing operations ────────────────────────────────

    /// Resolve the current user from the cached record and the collaborator.
    ///
    /// Returns `Ok(None)` when signed out. Collaborator failures and a failed
    /// admin check end signed out with the error retained and returned.
    pub async fn recheck(&self) -> Result<Option<ResolvedIdentity>, AuthError> {
        let _flight = self.enter()?;
        self.begin();

        match self.probe.read_presence().await {
            Ok(RecordPresence::Absent) => {
                debug!("No cached session");
                self.settle(None);
                return Ok(None);
            }
            Ok(presence) if self.staleness.is_presence_stale(&presence, Utc::now()) => {
                info!(
                    partial = presence.record().is_none(),
                    "Cached session is stale, clearing before any network call"
                );
                self.evict_stale().await;
                self.settle(None);
                return Ok(None);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Cannot read cached session, asking identity provider");
            }
        }

        let session = match self.identity.get_current_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("Identity provider reports no active session");
                self.invalidator.invalidate(ReloadPolicy::Never).await;
                self.settle(None);
                return Ok(None);
            }
            Err(e) => return Err(self.fail(AuthError::from_resolution(e))),
        };

        let identity = self.authorize(&session).await?;
        self.settle(Some(identity.clone()));
        Ok(Some(identity))
    }

    /// Sign in with email and password.
    ///
    /// Any cached state is cleared first. Valid credentials without an active
    /// admin profile are signed back out and reported as
    /// [`AuthError::NotAuthorized`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ResolvedIdentity, AuthError> {
        let _flight = self.enter()?;
        self.begin();
        let email = email.trim();
        info!(email = %email, "Signing in");

        self.invalidator.invalidate(ReloadPolicy::Never).await;

        let session = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| self.fail(AuthError::from_sign_in(e)))?;

        let identity = self.authorize(&session).await?;
        self.gate.record_login(identity.id).await;
        self.settle(Some(identity.clone()));

        info!(user_id = %identity.id, email = %email, "Signed in");
        Ok(identity)
    }

    /// Sign out. The collaborator call is best-effort; local state is always
    /// cleared.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let _flight = self.enter()?;
        self.begin();

        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "Identity provider sign-out failed, clearing local state anyway");
        }
        self.invalidator.invalidate(ReloadPolicy::Never).await;
        self.settle(None);

        info!("Signed out");
        Ok(())
    }

    /// Clear the auth cache on operator request and end signed out.
    pub async fn clear_cache(&self) -> Result<InvalidationReport, AuthError> {
        let _flight = self.enter()?;
        self.clear_last_error();

        let report = self.invalidator.invalidate(ReloadPolicy::IfOnLoginPage).await;
        if self.state() != SessionState::SIGNED_OUT {
            self.settle(None);
        }
        Ok(report)
    }

    /// Scheduled staleness check; never touches the network.
    ///
    /// Returns [`AuthError::StaleCache`] when it tore a session down, and
    /// [`AuthError::Busy`] when another operation holds the guard.
    pub async fn check_staleness(&self) -> Result<(), AuthError> {
        let _flight = self.enter()?;

        let presence = match self.probe.read_presence().await {
            Ok(presence) => presence,
            Err(e) => {
                debug!(error = %e, "Skipping staleness check, storage unreadable");
                return Ok(());
            }
        };

        let state = self.state();
        if presence.is_absent() && !state.is_authenticated() {
            return Ok(());
        }
        if !self.staleness.is_presence_stale(&presence, Utc::now()) {
            return Ok(());
        }

        info!(state = state.name(), "Cached session went stale, clearing");
        self.evict_stale().await;
        if state != SessionState::SIGNED_OUT {
            self.settle(None);
        }
        Err(AuthError::StaleCache)
    }

    /// React to an auth-change event from the collaborator.
    ///
    /// Waits for any in-flight operation instead of failing with `Busy`.
    pub async fn handle_auth_event(&self, event: AuthChangeEvent) {
        let _flight = self.flight.lock().await;
        self.apply_auth_event(event).await;
    }

    /// Follow the collaborator's auth-change stream until shutdown.
    ///
    /// Events emitted before the most recent state-changing operation ended
    /// are dropped, so a late `SignedOut` cannot tear down a newer sign-in.
    pub async fn follow_auth_events(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut events = self.identity.subscribe();
        self.following.store(true, Ordering::SeqCst);
        info!("Following identity provider auth events");

        loop {
            let received = tokio::select! {
                _ = shutdown.changed() => break,
                received = events.recv() => received,
            };

            match received {
                Ok(event) => {
                    let _flight = self.flight.lock().await;
                    if let Some(fresh) = self.take_fresh_events() {
                        debug!(
                            event = event.name(),
                            "Dropping auth event that predates the last operation"
                        );
                        events = fresh;
                        continue;
                    }
                    self.apply_auth_event(event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }

        self.following.store(false, Ordering::SeqCst);
        self.take_fresh_events();
        debug!("Auth event loop ended");
    }

    // ── Internals ────────────────────────────────────────────────

    fn enter(&self) -> Result<Flight<'_>, AuthError> {
        let guard = self.flight.try_lock().map_err(|_| AuthError::Busy)?;
        Ok(Flight {
            coordinator: self,
            _guard: guard,
        })
    }

    /// Start a new event epoch for the event loop, if one is running.
    fn fence_events(&self) {
        if !self.following.load(Ordering::SeqCst) {
            return;
        }
        let fresh = self.identity.subscribe();
        *self
            .fresh_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(fresh);
    }

    fn take_fresh_events(&self) -> Option<broadcast::Receiver<AuthChangeEvent>> {
        self.fresh_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Must be called with the flight guard held.
    async fn apply_auth_event(&self, event: AuthChangeEvent) {
        debug!(event = event.name(), "Auth change event");
        match event {
            AuthChangeEvent::SignedOut => {
                self.invalidator.invalidate(ReloadPolicy::Never).await;
                if self.state() != SessionState::SIGNED_OUT {
                    self.settle(None);
                }
            }
            AuthChangeEvent::TokenRefreshed(record) => {
                if self.state() == SessionState::SIGNED_OUT {
                    debug!("Ignoring token refresh while signed out");
                    return;
                }
                self.mirror(&record).await;
            }
            AuthChangeEvent::SignedIn(_) | AuthChangeEvent::UserUpdated(_) => {}
        }
    }

    fn begin(&self) {
        self.clear_last_error();
        self.listeners.publish(SessionState::Resolving);
    }

    fn clear_last_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn settle(&self, identity: Option<ResolvedIdentity>) {
        let state = SessionState::Resolved(identity);
        info!(state = state.name(), "Session state changed");
        self.listeners.publish(state);
    }

    /// Record `err`, end signed out and hand the error back.
    fn fail(&self, err: AuthError) -> AuthError {
        warn!(error = %err, detail = err.detail().unwrap_or(""), "Session operation failed");
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.clone());
        self.settle(None);
        err
    }

    /// Gate the session; on success mirror its record and build the identity.
    async fn authorize(&self, session: &AuthSession) -> Result<ResolvedIdentity, AuthError> {
        let check = self.gate.check(session.user.id).await;
        if !check.is_admin {
            warn!(user_id = %session.user.id, "Identity is not an active admin, signing out");
            if let Err(e) = self.identity.sign_out().await {
                warn!(error = %e, "Sign-out after failed admin check failed");
            }
            self.invalidator.invalidate(ReloadPolicy::Never).await;
            return Err(self.fail(AuthError::NotAuthorized));
        }

        self.mirror(&session.record).await;
        Ok(ResolvedIdentity::build(&session.user, check.profile))
    }

    async fn mirror(&self, record: &SessionTokenRecord) {
        if let Err(e) = self.probe.write_record(record).await {
            warn!(error = %e, "Failed to mirror session token record");
        }
    }

    async fn evict_stale(&self) {
        self.invalidator.invalidate(ReloadPolicy::IfOnLoginPage).await;
        self.stale_evictions.fetch_add(1, Ordering::Relaxed);
    }
}
