//! Known-state store: the durable record of previously observed paths.
//!
//! An in-memory map is authoritative for the running process and is
//! mirrored to `SQLite` so that restarts do not re-announce files that
//! were already seen.

mod error;
mod known;
mod schema;

pub use error::StoreError;
pub use known::{default_state_path, Entry, EntryKind, KnownStateStore};
pub use schema::SCHEMA;
