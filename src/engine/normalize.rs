//! Normalization of raw watch signals into canonical delta events.

use std::path::Path;
use std::sync::Arc;

use crate::store::{EntryKind, KnownStateStore};
use crate::watch::RawSignal;

use super::delta::{ChangeType, DeltaEvent};

/// Converts raw watch-source signals into [`DeltaEvent`]s, suppressing
/// signals for state the store already reflects.
#[derive(Debug)]
pub struct LiveEventNormalizer {
    store: Arc<KnownStateStore>,
}

impl LiveEventNormalizer {
    #[must_use]
    pub fn new(store: Arc<KnownStateStore>) -> Self {
        Self { store }
    }

    /// Normalize one raw signal.
    ///
    /// Returns `None` when the signal is suppressed: an addition of an
    /// already-known path, or a removal of an unknown one. `Change`
    /// signals always pass through; the store keeps no content hash, so
    /// repeated no-op changes are reported as modifications by design.
    pub async fn normalize(&self, signal: RawSignal) -> Option<DeltaEvent> {
        match signal {
            RawSignal::Add(path) => self.handle_add(&path, None).await,
            RawSignal::AddDir(path) => self.handle_add(&path, Some(EntryKind::Directory)).await,
            RawSignal::Change(path) => {
                let key = path.to_string_lossy().into_owned();
                let kind = self.store.kind_of(&key).unwrap_or(EntryKind::File);
                Some(DeltaEvent::new(key, kind, ChangeType::Modified))
            }
            RawSignal::Remove(path) | RawSignal::RemoveDir(path) => {
                let key = path.to_string_lossy().into_owned();
                // Unknown paths were never announced; nothing to retract
                let kind = self.store.kind_of(&key)?;
                self.store.remove(&key);
                Some(DeltaEvent::new(key, kind, ChangeType::Removed))
            }
            RawSignal::Error(err) => {
                tracing::warn!(error = %err, "Watch source error");
                None
            }
        }
    }

    async fn handle_add(&self, path: &Path, kind: Option<EntryKind>) -> Option<DeltaEvent> {
        let key = path.to_string_lossy().into_owned();
        if self.store.contains(&key) {
            return None;
        }

        let kind = match kind {
            Some(kind) => kind,
            None => probe_kind(path).await,
        };
        self.store.upsert(&key, kind);
        Some(DeltaEvent::new(key, kind, ChangeType::Added))
    }
}

/// Classify a path by filesystem metadata. Falls back to `File` when the
/// path is already gone by the time we look.
async fn probe_kind(path: &Path) -> EntryKind {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => EntryKind::Directory,
        _ => EntryKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn normalizer() -> (LiveEventNormalizer, Arc<KnownStateStore>) {
        let store = Arc::new(KnownStateStore::open_in_memory().await.unwrap());
        (LiveEventNormalizer::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_add_unknown_path_emits_added() {
        let (normalizer, store) = normalizer().await;

        let event = normalizer
            .normalize(RawSignal::Add(PathBuf::from("/share/new.txt")))
            .await
            .unwrap();

        assert_eq!(event.change, ChangeType::Added);
        assert_eq!(event.path, "/share/new.txt");
        assert!(store.contains("/share/new.txt"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_add_known_path_is_suppressed() {
        let (normalizer, store) = normalizer().await;
        store.upsert("/share/a.txt", EntryKind::File);

        let event = normalizer
            .normalize(RawSignal::Add(PathBuf::from("/share/a.txt")))
            .await;

        assert!(event.is_none());
        store.close().await;
    }

    #[tokio::test]
    async fn test_add_dir_carries_directory_kind() {
        let (normalizer, store) = normalizer().await;

        let event = normalizer
            .normalize(RawSignal::AddDir(PathBuf::from("/share/sub")))
            .await
            .unwrap();

        assert_eq!(event.kind, EntryKind::Directory);
        assert_eq!(store.kind_of("/share/sub"), Some(EntryKind::Directory));
        store.close().await;
    }

    #[tokio::test]
    async fn test_change_always_passes_through() {
        let (normalizer, store) = normalizer().await;

        // Even for paths the store has never seen
        let event = normalizer
            .normalize(RawSignal::Change(PathBuf::from("/share/a.txt")))
            .await
            .unwrap();
        assert_eq!(event.change, ChangeType::Modified);

        // And repeatedly for the same path
        let again = normalizer
            .normalize(RawSignal::Change(PathBuf::from("/share/a.txt")))
            .await;
        assert!(again.is_some());
        store.close().await;
    }

    #[tokio::test]
    async fn test_remove_known_path_emits_removed() {
        let (normalizer, store) = normalizer().await;
        store.upsert("/share/a.txt", EntryKind::File);

        let event = normalizer
            .normalize(RawSignal::Remove(PathBuf::from("/share/a.txt")))
            .await
            .unwrap();

        assert_eq!(event.change, ChangeType::Removed);
        assert_eq!(event.kind, EntryKind::File);
        assert!(!store.contains("/share/a.txt"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_remove_unknown_path_is_suppressed() {
        let (normalizer, store) = normalizer().await;

        let event = normalizer
            .normalize(RawSignal::Remove(PathBuf::from("/share/ghost.txt")))
            .await;

        assert!(event.is_none());
        store.close().await;
    }

    #[tokio::test]
    async fn test_remove_dir_uses_stored_kind() {
        let (normalizer, store) = normalizer().await;
        store.upsert("/share/sub", EntryKind::Directory);

        let event = normalizer
            .normalize(RawSignal::RemoveDir(PathBuf::from("/share/sub")))
            .await
            .unwrap();

        assert_eq!(event.kind, EntryKind::Directory);
        assert_eq!(event.label(), "Directory deleted");
        store.close().await;
    }

    #[tokio::test]
    async fn test_error_signal_yields_nothing() {
        let (normalizer, store) = normalizer().await;

        let event = normalizer
            .normalize(RawSignal::Error(crate::watch::WatchError::Notify(
                notify::Error::generic("boom"),
            )))
            .await;

        assert!(event.is_none());
        store.close().await;
    }

    #[tokio::test]
    async fn test_bare_add_probes_real_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir_path = temp_dir.path().join("nested");
        std::fs::create_dir(&dir_path).unwrap();

        let (normalizer, store) = normalizer().await;
        let event = normalizer
            .normalize(RawSignal::Add(dir_path.clone()))
            .await
            .unwrap();

        assert_eq!(event.kind, EntryKind::Directory);
        store.close().await;
    }
}
