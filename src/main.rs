//! GCH session agent.
//!
//! Keeps a back-office session alive in a headless host: resolves the
//! mirrored sign-in at start-up, follows the identity provider's auth
//! events, and re-checks the cache on a fixed period so that a stale
//! token is cleared before any request is made with it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use gch_auth::RecheckScheduler;
use gch_core::config::AppConfig;
use gch_core::error::AppError;
use gch_core::traits::page::HeadlessPage;
use gch_supabase::Backoffice;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Session agent error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("GCH_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GCH session agent v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Wire stores, collaborators and coordinator ───────
    let backoffice = Backoffice::connect(&config, Arc::new(HeadlessPage::default())).await?;
    let coordinator = backoffice.coordinator.clone();

    let _transitions = coordinator.subscribe(|state| {
        tracing::info!(state = %state, "Session state changed");
    });

    // ── Step 2: Resolve the mirrored session ─────────────────────
    match coordinator.recheck().await {
        Ok(Some(identity)) => {
            tracing::info!(user_id = %identity.id, email = ?identity.email, "Session restored")
        }
        Ok(None) => tracing::info!("No session to restore"),
        Err(e) => tracing::warn!(error = %e, "Initial session check failed"),
    }

    // ── Step 3: Background tasks ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    let scheduler = RecheckScheduler::from_config(coordinator.clone(), &config.session);
    tasks.push(tokio::spawn(scheduler.run(shutdown_rx.clone())));

    if config.session.follow_auth_events {
        tasks.push(tokio::spawn(
            coordinator.clone().follow_auth_events(shutdown_rx.clone()),
        ));
    }

    // ── Step 4: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping background tasks...");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    tracing::info!("GCH session agent stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
