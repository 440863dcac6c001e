//! Configuration types loaded from TOML.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Share being monitored.
    pub share: ShareSection,
    /// Reconciliation and watch cadence.
    pub poll: PollSection,
    /// Notification batching.
    pub batch: BatchSection,
    /// Outbound webhook.
    pub webhook: WebhookSection,
    /// Override for the state database path.
    pub state_db: Option<PathBuf>,
}

/// The share being monitored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareSection {
    /// Mount point of the share root.
    pub root: PathBuf,
    /// Optional domain for a protocol-level client.
    pub domain: Option<String>,
    /// Optional username for a protocol-level client.
    pub username: Option<String>,
    /// Optional password for a protocol-level client. Supplied via config,
    /// never compiled in.
    pub password: Option<String>,
}

impl Default for ShareSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/mnt/share"),
            domain: None,
            username: None,
            password: None,
        }
    }
}

/// Reconciliation and watch cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSection {
    /// Seconds between reconciliation passes over the full listing.
    pub reconcile_interval_secs: u64,
    /// Seconds between filesystem scans of the watch source. Network
    /// mounts do not deliver inotify events, so the watcher polls.
    pub watch_poll_interval_secs: u64,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: 360,
            watch_poll_interval_secs: 1,
        }
    }
}

impl PollSection {
    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs.max(1))
    }

    #[must_use]
    pub fn watch_poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch_poll_interval_secs.max(1))
    }
}

/// Notification batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Seconds between batch flushes to the notification sink.
    pub flush_interval_secs: u64,
    /// Maximum characters per delivered payload.
    pub size_cap: usize,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            flush_interval_secs: 360,
            size_cap: crate::engine::DEFAULT_SIZE_CAP,
        }
    }
}

impl BatchSection {
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }
}

/// Outbound webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSection {
    /// Webhook endpoint. When absent, payloads are logged instead of sent.
    pub url: Option<String>,
    /// Display name attached to each message.
    pub username: String,
    /// Embed accent color.
    pub color: u32,
}

impl Default for WebhookSection {
    fn default() -> Self {
        Self {
            url: None,
            username: "Notify".to_string(),
            color: 15_258_703,
        }
    }
}
