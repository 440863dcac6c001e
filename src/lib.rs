//! Sharewatch - network share change monitor with webhook notifications.

pub mod config;
pub mod engine;
pub mod remote;
pub mod store;
pub mod watch;
pub mod webhook;
