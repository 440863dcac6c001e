//! Persistence tests for the known-state store.

use sharewatch::store::{EntryKind, KnownStateStore};

#[tokio::test]
async fn state_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state.db");

    {
        let store = KnownStateStore::open(&db_path).await.unwrap();
        store.upsert("/share/a.txt", EntryKind::File);
        store.upsert("/share/sub", EntryKind::Directory);
        store.close().await;
    }

    let store = KnownStateStore::open(&db_path).await.unwrap();
    assert!(store.is_empty(), "memory starts cold before load");

    let recovered = store.load().await.unwrap();
    assert_eq!(recovered, 2);
    assert!(store.contains("/share/a.txt"));
    assert_eq!(store.kind_of("/share/sub"), Some(EntryKind::Directory));
}

#[tokio::test]
async fn removals_are_durable() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state.db");

    {
        let store = KnownStateStore::open(&db_path).await.unwrap();
        store.upsert("/share/a.txt", EntryKind::File);
        store.upsert("/share/b.txt", EntryKind::File);
        store.remove("/share/a.txt");
        store.close().await;
    }

    let store = KnownStateStore::open(&db_path).await.unwrap();
    store.load().await.unwrap();
    assert!(!store.contains("/share/a.txt"));
    assert!(store.contains("/share/b.txt"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn upsert_then_remove_never_resurrects_after_restart() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state.db");

    // The back-to-back upsert and remove must commit in issue order on
    // every run, or a phantom row survives the restart and the next
    // sighting of the path would be silently suppressed.
    for iteration in 0..100 {
        {
            let store = KnownStateStore::open(&db_path).await.unwrap();
            store.load().await.unwrap();
            store.upsert("/share/a.txt", EntryKind::File);
            store.remove("/share/a.txt");
            store.close().await;
        }

        let store = KnownStateStore::open(&db_path).await.unwrap();
        let recovered = store.load().await.unwrap();
        assert_eq!(
            recovered, 0,
            "removed row came back after restart (iteration {iteration})"
        );
        assert!(!store.contains("/share/a.txt"));
    }
}

#[tokio::test]
async fn repeated_upserts_keep_one_row() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state.db");

    {
        let store = KnownStateStore::open(&db_path).await.unwrap();
        for _ in 0..5 {
            store.upsert("/share/a.txt", EntryKind::File);
        }
        store.close().await;
    }

    let store = KnownStateStore::open(&db_path).await.unwrap();
    assert_eq!(store.load().await.unwrap(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn kind_change_is_an_update_not_a_new_row() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("state.db");

    {
        let store = KnownStateStore::open(&db_path).await.unwrap();
        store.upsert("/share/thing", EntryKind::File);
        store.upsert("/share/thing", EntryKind::Directory);
        store.close().await;
    }

    let store = KnownStateStore::open(&db_path).await.unwrap();
    assert_eq!(store.load().await.unwrap(), 1);
    assert_eq!(store.kind_of("/share/thing"), Some(EntryKind::Directory));
}
