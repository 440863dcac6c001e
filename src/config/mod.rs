//! Configuration loading and types.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{BatchSection, PollSection, ShareSection, WatchConfig, WebhookSection};
