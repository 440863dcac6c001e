//! Listing reconciliation against the known-state store.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::remote::ShareEntry;
use crate::store::{EntryKind, KnownStateStore};

use super::delta::{ChangeType, DeltaEvent};

/// Computes the delta between a fresh share listing and the known state.
///
/// Reconciliation is add-only: entries absent from a listing are never
/// removed, because a listing can be partial or truncated under remote
/// errors and absence must not be read as mass deletion. Removals come
/// exclusively from watch-source signals.
#[derive(Debug)]
pub struct Reconciler {
    store: Arc<KnownStateStore>,
    root: PathBuf,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<KnownStateStore>, root: PathBuf) -> Self {
        Self { store, root }
    }

    /// Membership snapshot to diff a pass against.
    ///
    /// The scheduler takes this before the listing call, so live events
    /// upserted while the listing is in flight cannot hide a path from
    /// the pass that is expected to announce it.
    #[must_use]
    pub fn baseline(&self) -> HashSet<String> {
        self.store.paths_snapshot()
    }

    /// Diff `listing` against the current known state and record every
    /// new entry, emitting `Added` events in lexical path order.
    pub fn reconcile(&self, listing: &[ShareEntry]) -> Vec<DeltaEvent> {
        let baseline = self.baseline();
        self.reconcile_against(listing, &baseline)
    }

    /// Diff `listing` against an explicit baseline snapshot.
    pub fn reconcile_against(
        &self,
        listing: &[ShareEntry],
        baseline: &HashSet<String>,
    ) -> Vec<DeltaEvent> {
        let mut fresh: Vec<&ShareEntry> = listing
            .iter()
            .filter(|entry| !baseline.contains(&self.key(&entry.name)))
            .collect();

        // Lexical order for deterministic event ordering within one pass
        fresh.sort_by(|a, b| a.name.cmp(&b.name));
        fresh.dedup_by(|a, b| a.name == b.name);

        fresh
            .into_iter()
            .map(|entry| {
                let path = self.key(&entry.name);
                let kind = if entry.is_directory {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                self.store.upsert(&path, kind);
                DeltaEvent::new(path, kind, ChangeType::Added)
            })
            .collect()
    }

    /// Canonical store key for a listing entry name.
    fn key(&self, name: &str) -> String {
        self.root.join(name).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Arc<KnownStateStore> {
        Arc::new(KnownStateStore::open_in_memory().await.unwrap())
    }

    fn reconciler(store: &Arc<KnownStateStore>) -> Reconciler {
        Reconciler::new(Arc::clone(store), PathBuf::from("/share"))
    }

    #[tokio::test]
    async fn test_empty_store_emits_all_added_in_order() {
        let store = store().await;
        let reconciler = reconciler(&store);

        // Listing deliberately out of order
        let listing = vec![ShareEntry::directory("sub"), ShareEntry::file("a.txt")];
        let events = reconciler.reconcile(&listing);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].path, "/share/a.txt");
        assert_eq!(events[0].change, ChangeType::Added);
        assert_eq!(events[0].kind, EntryKind::File);
        assert_eq!(events[1].path, "/share/sub");
        assert_eq!(events[1].kind, EntryKind::Directory);

        assert!(store.contains("/share/a.txt"));
        assert!(store.contains("/share/sub"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_known_entries_not_re_emitted() {
        let store = store().await;
        store.upsert("/share/a.txt", EntryKind::File);
        let reconciler = reconciler(&store);

        let listing = vec![ShareEntry::file("a.txt"), ShareEntry::file("b.txt")];
        let events = reconciler.reconcile(&listing);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, "/share/b.txt");
        store.close().await;
    }

    #[tokio::test]
    async fn test_deterministic_for_fixed_inputs() {
        let listing = vec![
            ShareEntry::file("c.txt"),
            ShareEntry::file("a.txt"),
            ShareEntry::directory("b"),
        ];

        let mut runs = Vec::new();
        for _ in 0..2 {
            let store = store().await;
            let reconciler = reconciler(&store);
            let paths: Vec<String> = reconciler
                .reconcile(&listing)
                .into_iter()
                .map(|e| e.path)
                .collect();
            runs.push(paths);
            store.close().await;
        }

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[0], ["/share/a.txt", "/share/b", "/share/c.txt"]);
    }

    #[tokio::test]
    async fn test_absent_entries_are_not_removed() {
        let store = store().await;
        store.upsert("/share/old.txt", EntryKind::File);
        let reconciler = reconciler(&store);

        // Listing no longer contains old.txt
        let events = reconciler.reconcile(&[ShareEntry::file("new.txt")]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change, ChangeType::Added);
        // Add-only policy: old.txt survives until a watch removal signal
        assert!(store.contains("/share/old.txt"));
        store.close().await;
    }

    #[tokio::test]
    async fn test_baseline_shields_mid_pass_upserts() {
        let store = store().await;
        let reconciler = reconciler(&store);

        let baseline = reconciler.baseline();
        // A live event lands between the baseline and the diff
        store.upsert("/share/new.txt", EntryKind::File);

        let events = reconciler.reconcile_against(&[ShareEntry::file("new.txt")], &baseline);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path, "/share/new.txt");
        store.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_listing_entries_collapse() {
        let store = store().await;
        let reconciler = reconciler(&store);

        let listing = vec![ShareEntry::file("a.txt"), ShareEntry::file("a.txt")];
        let events = reconciler.reconcile(&listing);
        assert_eq!(events.len(), 1);
        store.close().await;
    }
}
