//! Poll scheduling with non-overlap enforcement.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::remote::{RemoteError, ShareLister};

use super::delta::DeltaEvent;
use super::reconcile::Reconciler;

/// Runs reconciliation passes and guarantees they never overlap.
///
/// The running flag is the only mutual-exclusion state in the engine; a
/// tick that finds a pass in flight is skipped entirely and the next
/// tick tries again. No remote error is fatal: every failure is terminal
/// for the attempt only, and the scheduler always returns to idle.
#[derive(Debug, Default)]
pub struct PollScheduler {
    running: AtomicBool,
}

impl PollScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a reconciliation pass is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one reconciliation pass, or skip if one is already running.
    ///
    /// Listing failures are classified and logged; entries upserted
    /// before a failure stay recorded, which is idempotent on retry.
    pub async fn run_pass(
        &self,
        lister: &dyn ShareLister,
        reconciler: &Reconciler,
    ) -> Vec<DeltaEvent> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!("Reconciliation pass still in flight; skipping tick");
            return Vec::new();
        }

        // Baseline precedes the listing call so live events arriving
        // mid-pass cannot hide a path from this pass's diff.
        let baseline = reconciler.baseline();
        let events = match lister.list().await {
            Ok(listing) => {
                let events = reconciler.reconcile_against(&listing, &baseline);
                tracing::debug!(
                    listed = listing.len(),
                    added = events.len(),
                    "Reconciliation pass completed"
                );
                events
            }
            Err(err) => {
                Self::log_remote_error(&err);
                Vec::new()
            }
        };

        self.running.store(false, Ordering::Release);
        events
    }

    fn log_remote_error(err: &RemoteError) {
        match err {
            RemoteError::Auth(_) => {
                tracing::error!(error = %err, "Logon failure; check username and password");
            }
            RemoteError::Connection(_) => {
                tracing::warn!(error = %err, "Share unreachable; retrying next cycle");
            }
            RemoteError::Transient(_) => {
                tracing::debug!(error = %err, "Transient remote error ignored");
            }
            RemoteError::Other(_) => {
                tracing::error!(error = %err, "Share listing failed");
            }
        }
    }
}
