//! Stale cached sessions are cleared before any network call.

mod helpers;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use gch_auth::{AuthError, RecheckScheduler, SessionState};
use gch_cache::keys;
use gch_core::traits::kv_store::KeyValueStore;
use gch_entity::session::SessionTokenRecord;

use helpers::{LOGIN_PATH, TestHarness};

#[tokio::test]
async fn test_record_expiring_within_window_is_cleared_without_network() {
    let app = TestHarness::new();
    let record = SessionTokenRecord::new("abc", Utc::now() + Duration::minutes(2), "ref");
    app.probe.write_record(&record).await.unwrap();

    assert_eq!(app.coordinator.recheck().await, Ok(None));

    assert_eq!(app.provider.session_calls(), 0);
    assert!(!app.has_token_keys().await);
    assert_eq!(app.coordinator.stale_evictions(), 1);
    assert_eq!(app.coordinator.last_error(), None);
}

#[tokio::test]
async fn test_expired_record_is_cleared() {
    let app = TestHarness::new();
    let record = SessionTokenRecord::new("abc", Utc::now() - Duration::hours(2), "ref");
    app.probe.write_record(&record).await.unwrap();

    assert_eq!(app.coordinator.recheck().await, Ok(None));
    assert!(!app.has_token_keys().await);
}

#[tokio::test]
async fn test_partial_record_is_cleared() {
    let app = TestHarness::new();
    app.persistent.set(keys::ACCESS_TOKEN, "orphan").await.unwrap();

    assert_eq!(app.coordinator.recheck().await, Ok(None));

    assert_eq!(app.provider.session_calls(), 0);
    assert!(app.persistent.is_empty());
}

#[tokio::test]
async fn test_stale_eviction_on_login_page_reloads_once() {
    let app = TestHarness::on_page(LOGIN_PATH);
    let record = SessionTokenRecord::new("abc", Utc::now() + Duration::seconds(30), "ref");
    app.probe.write_record(&record).await.unwrap();

    app.coordinator.recheck().await.unwrap();
    assert_eq!(app.page.reload_count(), 1);

    // Nothing left to clear, so no reload loop.
    app.coordinator.recheck().await.unwrap();
    assert_eq!(app.page.reload_count(), 1);
}

#[tokio::test]
async fn test_stale_eviction_elsewhere_does_not_reload() {
    let app = TestHarness::new();
    let record = SessionTokenRecord::new("abc", Utc::now() + Duration::seconds(30), "ref");
    app.probe.write_record(&record).await.unwrap();

    app.coordinator.recheck().await.unwrap();
    assert_eq!(app.page.reload_count(), 0);
}

#[tokio::test]
async fn test_scheduled_check_tears_down_short_lived_session() {
    let app = TestHarness::with_token_lifetime(Duration::minutes(3));
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    assert!(app.coordinator.state().is_authenticated());

    assert_eq!(
        app.coordinator.check_staleness().await,
        Err(AuthError::StaleCache)
    );

    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert!(!app.has_token_keys().await);
    assert_eq!(app.coordinator.last_error(), None);
}

#[tokio::test]
async fn test_scheduled_check_leaves_healthy_session() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();

    assert_eq!(app.coordinator.check_staleness().await, Ok(()));

    assert!(app.coordinator.state().is_authenticated());
    assert!(app.has_token_keys().await);
    assert_eq!(app.coordinator.stale_evictions(), 0);
}

#[tokio::test]
async fn test_scheduled_check_with_empty_cache_is_quiet() {
    let app = TestHarness::new();

    assert_eq!(app.coordinator.check_staleness().await, Ok(()));
    assert_eq!(app.coordinator.state(), SessionState::Unresolved);
}

#[tokio::test]
async fn test_scheduler_tick_reports_eviction() {
    let app = TestHarness::with_token_lifetime(Duration::minutes(1));
    app.add_admin("admin@gch.com", "secret").await;
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();

    let scheduler = RecheckScheduler::new(Arc::clone(&app.coordinator), StdDuration::from_secs(60));
    assert!(scheduler.tick().await);
    assert!(!scheduler.tick().await);

    let diagnostics = app.coordinator.diagnostics().await;
    assert_eq!(diagnostics.verdict(), "empty");
    assert_eq!(diagnostics.stale_evictions, 1);
    assert_eq!(diagnostics.state, "signed_out");
}

#[tokio::test]
async fn test_diagnostics_flag_stale_record_before_eviction() {
    let app = TestHarness::new();
    let record = SessionTokenRecord::new("abc", Utc::now() + Duration::minutes(1), "ref");
    app.probe.write_record(&record).await.unwrap();

    let diagnostics = app.coordinator.diagnostics().await;

    assert_eq!(diagnostics.verdict(), "stale");
    assert!(diagnostics.stale);
    assert!(diagnostics.token_keys.iter().all(|k| k.present));
}
