//! Auth-change events followed in the background.

mod helpers;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use gch_auth::SessionState;
use gch_auth::provider::AuthChangeEvent;

use helpers::TestHarness;

fn follow(app: &TestHarness) -> (watch::Sender<bool>, JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(app.coordinator.clone().follow_auth_events(shutdown_rx));
    (shutdown_tx, task)
}

async fn drain() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_sign_out_event_from_earlier_operation_keeps_newer_session() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    let (shutdown_tx, task) = follow(&app);
    tokio::task::yield_now().await;

    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    app.coordinator.sign_out().await.unwrap();
    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    drain().await;

    assert!(app.coordinator.state().is_authenticated());
    assert!(app.has_token_keys().await);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_sign_out_event_after_last_operation_is_applied() {
    let app = TestHarness::new();
    app.add_admin("admin@gch.com", "secret").await;
    let (shutdown_tx, task) = follow(&app);
    tokio::task::yield_now().await;

    app.coordinator.sign_in("admin@gch.com", "secret").await.unwrap();
    drain().await;
    assert!(app.coordinator.state().is_authenticated());

    app.provider.emit(AuthChangeEvent::SignedOut);
    drain().await;

    assert_eq!(app.coordinator.state(), SessionState::SIGNED_OUT);
    assert!(!app.has_token_keys().await);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap();
}
