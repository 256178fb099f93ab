//! End-to-end session behaviour over in-memory collaborators.

mod helpers;

use std::sync::{Arc, Mutex};

use chrono::Utc;

use gch_auth::provider::AdminProfileStore;
use gch_auth::provider::memory::INVALID_LOGIN_MESSAGE;
use gch_auth::{AuthError, SessionState};
use gch_cache::keys;
use gch_core::traits::kv_store::KeyValueStore;
use gch_entity::admin::UpdateAdminProfile;

use helpers::{LOGIN_PATH, TestHarness};

#[tokio::test]
async fn test_admin_sign_in_mirrors_record_and_stamps_login() {
    let app = TestHarness::new();
    let user = app.add_admin("admin@gch.com", "secret").await;

    let identity = app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();

    assert_eq!(identity.id, user.id);
    assert!(identity.is_admin);
    assert_eq!(identity.display_name.as_deref(), Some("Test Admin"));
    assert!(app.coordinator.state().is_authenticated());
    assert!(app.probe.read_record().await.unwrap().is_some());

    let profile = app.admins.find_by_user_id(user.id).await.unwrap().unwrap();
    assert!(profile.last_login.is_some());
}

#[tokio::test]
async fn test_sign_in_trims_email() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;

    assert!(app.coordinator.sign_in("  admin@gch.com ", "secret").await.is_ok());
}

#[tokio::test]
async fn test_non_admin_sign_in_is_denied_and_leaves_nothing_behind() {
    let app = TestHarness::new();
    app.add_user("visitor@gch.com", "secret").await;

    let err = app
        .coordinator
        .sign_in("visitor@gch.com", "secret")
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::NotAuthorized);
    assert_eq!(
        err.to_string(),
        "Access denied. You are not authorized as an admin."
    );
    assert!(!app.has_token_keys().await);
    assert_eq!(app.provider.sign_out_calls(), 1);
    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert_eq!(app.coordinator.last_error(), Some(AuthError::NotAuthorized));
}

#[tokio::test]
async fn test_deactivated_admin_is_denied() {
    let app = TestHarness::new();
    let user = app.add_admin("old@gch.com", "secret").await;
    let profile = app.admins.find_by_user_id(user.id).await.unwrap().unwrap();
    app.admins
        .update(
            profile.id,
            UpdateAdminProfile {
                is_active: Some(false),
                ..UpdateAdminProfile::default()
            },
        )
        .await
        .unwrap();

    let result = app.coordinator.sign_in("old@gch.com", "secret").await;
    assert_eq!(result, Err(AuthError::NotAuthorized));
    assert!(!app.has_token_keys().await);
}

#[tokio::test]
async fn test_admin_lookup_failure_fails_closed() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.admins.set_failing(true);

    let result = app.coordinator.sign_in("admin@gch.com", "secret").await;
    assert_eq!(result, Err(AuthError::NotAuthorized));
    assert!(!app.coordinator.state().is_authenticated());
}

#[tokio::test]
async fn test_wrong_password_reports_provider_message() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;

    let result = app.coordinator.sign_in("admin@gch.com", "wrong").await;

    assert_eq!(
        result,
        Err(AuthError::InvalidCredentials(INVALID_LOGIN_MESSAGE.to_string()))
    );
    assert!(!app.has_token_keys().await);
    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
}

#[tokio::test]
async fn test_unreachable_provider_is_a_network_error() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.provider.set_unreachable(true);

    let result = app.coordinator.sign_in("admin@gch.com", "secret").await;
    assert!(matches!(result, Err(AuthError::Network(_))));
}

#[tokio::test]
async fn test_sign_in_clears_previous_state_first() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.session.set("draft", "{}").await.unwrap();
    app.responses.insert("GET https://x/rest/v1/projects", "[]").await;

    app.coordinator.sign_in("admin@gch.com", "wrong").await.unwrap_err();

    assert!(app.session.is_empty());
    assert_eq!(app.responses.len().await, 0);
}

#[tokio::test]
async fn test_sign_out_always_ends_signed_out() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();

    app.provider.set_unreachable(true);
    assert_eq!(app.coordinator.sign_out().await, Ok(()));

    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert!(!app.has_token_keys().await);
}

#[tokio::test]
async fn test_sign_out_when_never_signed_in() {
    let app = TestHarness::new();
    app.persistent.set(keys::ACCESS_TOKEN, "orphan").await.unwrap();
    app.persistent
        .set("sb-project-auth-token", "{\"access_token\":\"x\"}")
        .await
        .unwrap();
    app.session.set("draft", "{}").await.unwrap();
    app.session.set("supabase.auth.flow", "pkce").await.unwrap();

    assert_eq!(app.coordinator.sign_out().await, Ok(()));

    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert!(!app.has_token_keys().await);
    assert!(app.persistent.is_empty());
    assert!(app.session.is_empty());
    assert_eq!(app.page.reload_count(), 0);
}

#[tokio::test]
async fn test_recheck_restores_provider_session() {
    let app = TestHarness::new();
    let user = app.add_admin("admin@gch.com", "secret").await;
    let session = app.provider.issue_session(&user).await;
    app.probe.write_record(&session.record).await.unwrap();

    let identity = app.coordinator.recheck().await.unwrap();

    assert_eq!(identity.map(|i| i.id), Some(user.id));
    assert_eq!(app.provider.session_calls(), 1);
}

#[tokio::test]
async fn test_recheck_clears_cache_when_provider_has_no_session() {
    let app = TestHarness::new();
    let user = app.add_admin("admin@gch.com", "secret").await;
    let session = app.provider.issue_session(&user).await;
    app.probe.write_record(&session.record).await.unwrap();
    app.provider.set_session(None).await;

    assert_eq!(app.coordinator.recheck().await, Ok(None));
    assert!(!app.has_token_keys().await);
}

#[tokio::test]
async fn test_recheck_network_failure_is_retained() {
    let app = TestHarness::new();
    let user = app.add_admin("admin@gch.com", "secret").await;
    let session = app.provider.issue_session(&user).await;
    app.probe.write_record(&session.record).await.unwrap();
    app.provider.set_unreachable(true);

    let err = app.coordinator.recheck().await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(app.coordinator.last_error(), Some(err));
    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
}

#[tokio::test]
async fn test_listener_is_replayed_then_follows_transitions() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_out().await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = app.coordinator.subscribe(move |state| {
        sink.lock().unwrap().push(state.name());
    });

    assert_eq!(*seen.lock().unwrap(), vec!["signed_out"]);

    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["signed_out", "resolving", "signed_in"]
    );

    assert!(subscription.unsubscribe());
    app.coordinator.sign_out().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_dropped_subscription_stops_delivery() {
    let app = TestHarness::new();
    let count = Arc::new(Mutex::new(0usize));
    let sink = count.clone();

    {
        let _subscription = app.coordinator.subscribe(move |_| {
            *sink.lock().unwrap() += 1;
        });
    }
    app.coordinator.sign_out().await.unwrap();

    assert_eq!(*count.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_clear_cache_is_idempotent() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    app.persistent.set("supabase.auth.code_verifier", "v").await.unwrap();

    let first = app.coordinator.clear_cache().await.unwrap();
    assert_eq!(first.persistent_keys_removed, 4);
    assert!(!first.reloaded);

    let second = app.coordinator.clear_cache().await.unwrap();
    assert!(second.is_noop());
    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert!(app.persistent.is_empty());
}

#[tokio::test]
async fn test_clear_cache_on_login_page_reloads() {
    let app = TestHarness::on_page(LOGIN_PATH);

    let report = app.coordinator.clear_cache().await.unwrap();

    assert!(report.reloaded);
    assert_eq!(app.page.reload_count(), 1);
}

#[tokio::test]
async fn test_diagnostics_reflect_signed_in_session() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();

    let diagnostics = app.coordinator.diagnostics().await;

    assert_eq!(diagnostics.verdict(), "healthy");
    assert_eq!(diagnostics.state, "signed_in");
    assert_eq!(diagnostics.signed_in_as.as_deref(), Some("admin@gch.com"));
    assert!(diagnostics.token_keys.iter().all(|k| k.present));
    assert!(diagnostics.expires_at.is_some_and(|at| at > Utc::now()));
}
