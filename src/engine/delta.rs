//! Canonical change events.

use chrono::{DateTime, Local};

use crate::store::EntryKind;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// A single detected change in canonical form.
///
/// Produced by either the reconciler or the live-event normalizer;
/// consumed exactly once by the batcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEvent {
    pub path: String,
    pub kind: EntryKind,
    pub change: ChangeType,
    pub observed_at: DateTime<Local>,
}

impl DeltaEvent {
    #[must_use]
    pub fn new(path: impl Into<String>, kind: EntryKind, change: ChangeType) -> Self {
        Self {
            path: path.into(),
            kind,
            change,
            observed_at: Local::now(),
        }
    }

    /// Human-readable label for the change.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match (self.change, self.kind) {
            (ChangeType::Added, EntryKind::File) => "File added",
            (ChangeType::Added, EntryKind::Directory) => "Directory added",
            (ChangeType::Removed, EntryKind::File) => "File deleted",
            (ChangeType::Removed, EntryKind::Directory) => "Directory deleted",
            (ChangeType::Modified, _) => "File changed",
        }
    }

    /// Render the event as one notification line.
    #[must_use]
    pub fn render_line(&self) -> String {
        format!(
            "{} - {} - {} - {}",
            self.observed_at.format("%Y-%m-%d"),
            self.observed_at.format("%H:%M:%S"),
            self.label(),
            self.path
        )
    }
}
