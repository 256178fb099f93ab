//! In-memory identity provider and admin-profile store.
//!
//! Used by the session agent's offline mode and by tests. Failure toggles let
//! callers simulate an unreachable collaborator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

use gch_core::error::AppError;
use gch_core::result::AppResult;
use gch_entity::admin::{AdminProfile, NewAdminProfile, UpdateAdminProfile};
use gch_entity::identity::ExternalIdentity;
use gch_entity::session::{AuthSession, SessionTokenRecord};

use super::admin_store::AdminProfileStore;
use super::identity::{AuthChangeEvent, IdentityProvider};

/// Message returned for unknown email/password combinations.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid login credentials";

/// Event channel capacity.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: ExternalIdentity,
}

/// Identity provider backed by a fixed set of accounts.
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthChangeEvent>,
    token_lifetime: Duration,
    unreachable: AtomicBool,
    fail_sign_out: AtomicBool,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    session_calls: AtomicUsize,
}

impl MemoryIdentityProvider {
    /// Create a provider that issues one-hour tokens.
    pub fn new() -> Self {
        Self::with_token_lifetime(Duration::hours(1))
    }

    /// Create a provider that issues tokens valid for `lifetime`.
    pub fn with_token_lifetime(lifetime: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: Mutex::new(None),
            events,
            token_lifetime: lifetime,
            unreachable: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            session_calls: AtomicUsize::new(0),
        }
    }

    /// Register an account and return its identity.
    pub async fn add_account(&self, email: &str, password: &str) -> ExternalIdentity {
        let user = ExternalIdentity::new(Uuid::new_v4(), Some(email.to_string()));
        self.accounts.write().await.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Replace the current session without going through sign-in.
    pub async fn set_session(&self, session: Option<AuthSession>) {
        *self.current.lock().await = session;
    }

    /// Issue a fresh session for `user` and make it current.
    pub async fn issue_session(&self, user: &ExternalIdentity) -> AuthSession {
        let session = AuthSession {
            record: self.issue_record(),
            user: user.clone(),
        };
        self.set_session(Some(session.clone())).await;
        session
    }

    /// Simulate the collaborator being unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make `sign_out` fail (after clearing the local session).
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    /// Push an event to subscribers.
    pub fn emit(&self, event: AuthChangeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Number of sign-in calls received.
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of sign-out calls received.
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Number of current-session lookups received.
    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }

    fn issue_record(&self) -> SessionTokenRecord {
        SessionTokenRecord::new(
            format!("access-{}", Uuid::new_v4()),
            Utc::now() + self.token_lifetime,
            format!("refresh-{}", Uuid::new_v4()),
        )
    }

    fn check_reachable(&self) -> AppResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable(
                "identity provider is unreachable",
            ));
        }
        Ok(())
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let account = self
            .accounts
            .read()
            .await
            .get(&email.to_lowercase())
            .cloned()
            .filter(|a| a.password == password)
            .ok_or_else(|| AppError::authentication(INVALID_LOGIN_MESSAGE))?;

        let session = self.issue_session(&account.user).await;
        debug!(user_id = %account.user.id, "Issued in-memory session");
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let had_session = self.current.lock().await.take().is_some();
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AppError::external_service("sign-out request failed"));
        }
        if had_session {
            self.emit(AuthChangeEvent::SignedOut);
        }
        Ok(())
    }

    async fn get_current_session(&self) -> AppResult<Option<AuthSession>> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.current.lock().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChangeEvent> {
        self.events.subscribe()
    }
}

/// Admin-profile store kept in a map keyed by profile ID.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdminProfileStore {
    profiles: Arc<RwLock<HashMap<Uuid, AdminProfile>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryAdminProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every query fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::database("admin_users query failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminProfileStore for MemoryAdminProfileStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<AdminProfile>> {
        self.check()?;
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminProfile>> {
        self.check()?;
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<AdminProfile>> {
        self.check()?;
        let mut profiles: Vec<AdminProfile> =
            self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn insert(&self, profile: NewAdminProfile) -> AppResult<AdminProfile> {
        self.check()?;
        let mut profiles = self.profiles.write().await;
        if profiles.values().any(|p| p.user_id == profile.user_id) {
            return Err(AppError::conflict(format!(
                "An admin profile already exists for user {}",
                profile.user_id
            )));
        }

        let now = Utc::now();
        let stored = AdminProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
            is_active: profile.is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        profiles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, changes: UpdateAdminProfile) -> AppResult<AdminProfile> {
        self.check()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Admin profile {id} not found")))?;
        changes.apply_to(profile, Utc::now());
        Ok(profile.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        self.check()?;
        Ok(self.profiles.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gch_core::error::ErrorKind;
    use gch_entity::admin::AdminRole;

    fn new_profile(user_id: Uuid) -> NewAdminProfile {
        NewAdminProfile {
            user_id,
            email: "ana@gch.com".to_string(),
            full_name: "Ana".to_string(),
            role: AdminRole::Admin,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_sign_in_rejects_wrong_password() {
        let provider = MemoryIdentityProvider::new();
        provider.add_account("ana@gch.com", "secret").await;

        let err = provider
            .sign_in_with_password("ana@gch.com", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, INVALID_LOGIN_MESSAGE);
    }

    #[tokio::test]
    async fn test_sign_in_and_out_emit_events() {
        let provider = MemoryIdentityProvider::new();
        provider.add_account("ana@gch.com", "secret").await;
        let mut events = provider.subscribe();

        provider
            .sign_in_with_password("ana@gch.com", "secret")
            .await
            .unwrap();
        assert!(provider.get_current_session().await.unwrap().is_some());
        provider.sign_out().await.unwrap();

        assert_eq!(events.recv().await.unwrap().name(), "SIGNED_IN");
        assert_eq!(events.recv().await.unwrap(), AuthChangeEvent::SignedOut);
        assert!(provider.get_current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let provider = MemoryIdentityProvider::new();
        provider.set_unreachable(true);
        let err = provider.get_current_session().await.unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(provider.session_calls(), 1);
    }

    #[tokio::test]
    async fn test_store_crud() {
        let store = MemoryAdminProfileStore::new();
        let user_id = Uuid::new_v4();
        let created = store.insert(new_profile(user_id)).await.unwrap();

        assert!(store.insert(new_profile(user_id)).await.is_err());
        assert_eq!(
            store.find_by_email("ANA@gch.com").await.unwrap(),
            Some(created.clone())
        );

        let updated = store
            .update(
                created.id,
                UpdateAdminProfile {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_touch_last_login_by_user_id() {
        let store = MemoryAdminProfileStore::new();
        let user_id = Uuid::new_v4();
        store.insert(new_profile(user_id)).await.unwrap();

        let at = Utc::now();
        store.touch_last_login(user_id, at).await.unwrap();
        let profile = store.find_by_user_id(user_id).await.unwrap().unwrap();
        assert_eq!(profile.last_login, Some(at));

        // Unknown user is a no-op.
        store.touch_last_login(Uuid::new_v4(), at).await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryAdminProfileStore::new();
        store.set_failing(true);
        let err = store.list().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Database);
    }
}
