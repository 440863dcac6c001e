//! The daemon loop: wires the scheduler, normalizer and batcher together.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::remote::ShareLister;
use crate::store::KnownStateStore;
use crate::watch::RawSignal;
use crate::webhook::NotifySink;

use super::batch::EventBatcher;
use super::delta::DeltaEvent;
use super::normalize::LiveEventNormalizer;
use super::reconcile::Reconciler;
use super::scheduler::PollScheduler;

/// Owns the engine state and runs the single logical worker loop.
///
/// Everything that mutates the pending batch goes through this struct on
/// one task, so append and flush are mutually exclusive by construction.
/// Reconciliation passes run as spawned tasks (the loop keeps consuming
/// live signals while a pass is in flight) and report their events back
/// over a channel.
pub struct Daemon {
    store: Arc<KnownStateStore>,
    reconciler: Arc<Reconciler>,
    normalizer: LiveEventNormalizer,
    scheduler: Arc<PollScheduler>,
    lister: Arc<dyn ShareLister>,
    sink: Arc<dyn NotifySink>,
    batcher: EventBatcher,
    processed: u64,
}

impl Daemon {
    #[must_use]
    pub fn new(
        store: Arc<KnownStateStore>,
        lister: Arc<dyn ShareLister>,
        sink: Arc<dyn NotifySink>,
        share_root: PathBuf,
        size_cap: usize,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&store), share_root));
        let normalizer = LiveEventNormalizer::new(Arc::clone(&store));
        Self {
            store,
            reconciler,
            normalizer,
            scheduler: Arc::new(PollScheduler::new()),
            lister,
            sink,
            batcher: EventBatcher::new(size_cap),
            processed: 0,
        }
    }

    /// Whether a reconciliation pass is currently in flight.
    #[must_use]
    pub fn pass_in_flight(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Run the initial full index of the share.
    ///
    /// Everything found is recorded as known but nothing is announced;
    /// startup state is a baseline, not a change. Returns the number of
    /// newly recorded entries.
    pub async fn initial_index(&self) -> usize {
        tracing::info!("Initial indexing starting");
        let events = self
            .scheduler
            .run_pass(self.lister.as_ref(), &self.reconciler)
            .await;
        tracing::info!(
            added = events.len(),
            known = self.store.len(),
            "Initial indexing completed"
        );
        events.len()
    }

    /// Run the daemon until `shutdown` is cancelled.
    ///
    /// Pending notifications are flushed once more on the way out, and
    /// queued durable writes are drained by the caller closing the store.
    pub async fn run(
        mut self,
        mut signals: mpsc::UnboundedReceiver<RawSignal>,
        poll_interval: Duration,
        flush_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let (pass_tx, mut pass_rx) = mpsc::unbounded_channel::<Vec<DeltaEvent>>();

        // First interval tick would fire immediately; the initial index
        // already covered that ground.
        let start = tokio::time::Instant::now();
        let mut poll_tick = tokio::time::interval_at(start + poll_interval, poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flush_tick = tokio::time::interval_at(start + flush_interval, flush_interval);
        flush_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Polling beginning");
        loop {
            // Completed-pass events drain before live signals so a
            // removal queued behind a pass cannot be announced ahead of
            // that pass's addition for the same path.
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                Some(events) = pass_rx.recv() => self.announce_pass(events),
                _ = poll_tick.tick() => self.spawn_pass(&pass_tx),
                _ = flush_tick.tick() => self.flush().await,
                Some(signal) = signals.recv() => self.handle_signal(signal).await,
            }
        }

        tracing::info!("Shutting down; flushing pending notifications");
        self.flush().await;
    }

    /// Run one reconciliation pass inline and batch its events.
    pub async fn reconcile_now(&mut self) {
        let events = self
            .scheduler
            .run_pass(self.lister.as_ref(), &self.reconciler)
            .await;
        self.announce_pass(events);
    }

    /// Batch the events a completed pass reported.
    pub fn announce_pass(&mut self, events: Vec<DeltaEvent>) {
        for event in events {
            self.announce(&event);
        }
    }

    /// Kick off a reconciliation pass without blocking the loop; its
    /// events arrive on `pass_tx` when the pass completes.
    pub fn spawn_pass(&self, pass_tx: &mpsc::UnboundedSender<Vec<DeltaEvent>>) {
        let scheduler = Arc::clone(&self.scheduler);
        let lister = Arc::clone(&self.lister);
        let reconciler = Arc::clone(&self.reconciler);
        let pass_tx = pass_tx.clone();
        tokio::spawn(async move {
            let events = scheduler.run_pass(lister.as_ref(), &reconciler).await;
            if !events.is_empty() {
                let _ = pass_tx.send(events);
            }
        });
    }

    /// Normalize one live signal and batch the resulting event.
    ///
    /// While a reconciliation pass is in flight, the event still lands in
    /// the store but is withheld from the batch; the pass announces the
    /// paths it discovers itself, and announcing here too would duplicate
    /// them.
    pub async fn handle_signal(&mut self, signal: RawSignal) {
        let Some(event) = self.normalizer.normalize(signal).await else {
            return;
        };

        if self.scheduler.is_running() {
            self.processed += 1;
            tracing::debug!(
                count = self.processed,
                path = %event.path,
                "Recorded during reconciliation pass; not announced"
            );
            return;
        }

        self.announce(&event);
    }

    /// Flush the pending batch into the sink.
    ///
    /// Delivery failures drop the payload; the batch is already cleared.
    pub async fn flush(&mut self) {
        if self.batcher.is_empty() {
            return;
        }

        for payload in self.batcher.flush() {
            if let Err(e) = self.sink.deliver(&payload).await {
                tracing::error!(error = %e, "Notification delivery failed; payload dropped");
            }
        }
    }

    fn announce(&mut self, event: &DeltaEvent) {
        self.processed += 1;
        tracing::info!(count = self.processed, "{}", event.render_line());
        self.batcher.append(event);
    }
}
