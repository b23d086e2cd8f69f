//! Refresh scheduler
//!
//! Drives the refresh coordinator on a fixed cadence for as long as the
//! current route carries an authenticated session. The cadence is a
//! tunable; the property that matters is that the renewal threshold is
//! never missed by more than one tick. The first check runs immediately on
//! start to cover a tab that was inactive past the threshold.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::refresh::{RefreshCoordinator, RefreshOutcome};

/// Decides whether a tick may run (wired by the caller to "current route is
/// not an unauthenticated entry point")
pub type SchedulerGate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Interval loop around [`RefreshCoordinator::check_and_refresh`]
///
/// A tick failure never unregisters future ticks; only the terminal
/// refresh-token-expired outcome stops the loop, because no further attempt
/// can succeed.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawn the scheduler task
    pub fn spawn(
        refresh: Arc<RefreshCoordinator>,
        cadence: Duration,
        gate: SchedulerGate,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(cadence);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                // First tick completes immediately.
                ticks.tick().await;

                if !gate() {
                    continue;
                }

                match refresh.check_and_refresh(false).await {
                    RefreshOutcome::SessionExpired => {
                        info!("Refresh token expired; stopping scheduler");
                        break;
                    }
                    RefreshOutcome::Failed(e) => {
                        // Transient; the next tick retries.
                        warn!(error = %e, "Scheduled refresh failed");
                    }
                    outcome => {
                        debug!(outcome = ?outcome, "Scheduled refresh tick");
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stop the interval (unmount / navigation to an unauthenticated route)
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Whether the loop has ended (stopped or terminal)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("finished", &self.is_finished())
            .finish()
    }
}
