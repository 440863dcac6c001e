//! The change-detection and notification-batching engine.
//!
//! A poll scheduler runs reconciliation passes over the share listing,
//! live watch signals are normalized against the known-state store, and
//! both flows feed a size-capped event batcher that drains into the
//! notification sink.

mod batch;
mod daemon;
mod delta;
mod normalize;
mod reconcile;
mod scheduler;

pub use batch::{EventBatcher, Payload, DEFAULT_SIZE_CAP};
pub use daemon::Daemon;
pub use delta::{ChangeType, DeltaEvent};
pub use normalize::LiveEventNormalizer;
pub use reconcile::Reconciler;
pub use scheduler::PollScheduler;
