//! Live filesystem watching of the share mount.
//!
//! Bridges raw notify events into the engine's signal vocabulary.
//! Delivery is best-effort; reconciliation is the backstop for dropped
//! signals.

mod error;
mod share_watcher;

pub use error::WatchError;
pub use share_watcher::{RawSignal, ShareWatcher};
