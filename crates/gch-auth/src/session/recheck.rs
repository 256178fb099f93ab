//! The single scheduled staleness re-check.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use gch_core::config::session::SessionConfig;

use crate::error::AuthError;

use super::coordinator::SessionCoordinator;

/// Runs [`SessionCoordinator::check_staleness`] on a fixed interval.
///
/// Ticks that find another operation in flight are skipped.
#[derive(Debug, Clone)]
pub struct RecheckScheduler {
    coordinator: Arc<SessionCoordinator>,
    period: Duration,
}

impl RecheckScheduler {
    /// Create a scheduler with an explicit period.
    pub fn new(coordinator: Arc<SessionCoordinator>, period: Duration) -> Self {
        Self {
            coordinator,
            period: period.max(Duration::from_secs(1)),
        }
    }

    /// Create a scheduler from the session configuration.
    pub fn from_config(coordinator: Arc<SessionCoordinator>, config: &SessionConfig) -> Self {
        Self::new(
            coordinator,
            Duration::from_secs(config.recheck_interval_seconds),
        )
    }

    /// The tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one tick. Returns whether a stale session was torn down.
    pub async fn tick(&self) -> bool {
        match self.coordinator.check_staleness().await {
            Ok(()) => false,
            Err(AuthError::StaleCache) => {
                info!("Scheduled re-check cleared a stale session");
                true
            }
            Err(AuthError::Busy) => {
                debug!("Skipping scheduled re-check, another operation is in flight");
                false
            }
            Err(e) => {
                warn!(error = %e, "Scheduled re-check failed");
                false
            }
        }
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first check runs one full period after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval_at(time::Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "Session re-check scheduler started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.tick().await;
                    let diagnostics = self.coordinator.diagnostics().await;
                    debug!(
                        evicted,
                        state = %diagnostics.state,
                        stale = diagnostics.stale,
                        expires_in_secs = diagnostics.expires_in_seconds,
                        "Session re-check tick"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Session re-check scheduler stopped");
    }
}
