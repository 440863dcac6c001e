//! Known-state store implementation with async `SQLite` mirroring.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use tokio::sync::{mpsc, Mutex};
use tokio_util::task::TaskTracker;

use super::error::StoreError;
use super::schema::SCHEMA;

/// Returns the default path for the state database.
///
/// This is `~/.local/share/sharewatch/state.db` on Unix systems.
#[must_use]
pub fn default_state_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sharewatch")
        .join("state.db")
}

/// Kind of a tracked share entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "directory" => Self::Directory,
            _ => Self::File,
        }
    }
}

/// A tracked entry: one path observed on the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub last_seen: DateTime<Utc>,
}

/// Durable write operations queued against the database.
#[derive(Debug)]
enum WriteOp {
    Upsert {
        path: String,
        kind: EntryKind,
        last_seen: DateTime<Utc>,
    },
    Delete {
        path: String,
    },
}

/// The authoritative record of previously observed paths.
///
/// Membership checks hit the in-memory map; every mutation also queues
/// exactly one durable write. A single writer task drains the queue in
/// issue order, so the database replays mutations in the sequence they
/// happened in memory. A failed durable write is logged and the
/// in-memory state stays authoritative for the running process, so the
/// database may lag until the next successful write for that path.
#[derive(Debug)]
pub struct KnownStateStore {
    entries: RwLock<HashMap<String, (EntryKind, DateTime<Utc>)>>,
    conn: Arc<Mutex<Connection>>,
    write_tx: std::sync::Mutex<Option<mpsc::UnboundedSender<WriteOp>>>,
    writer: TaskTracker,
    path: Option<PathBuf>,
}

impl KnownStateStore {
    /// Open a store backed by a database file.
    ///
    /// Creates parent directories if they don't exist and initializes the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(&path_clone).map_err(|source| StoreError::DatabaseOpen {
                path: path_clone,
                source,
            })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        let conn = Arc::new(Mutex::new(conn));
        let (write_tx, writer) = Self::spawn_writer(Arc::clone(&conn));

        Ok(Self {
            entries: RwLock::new(HashMap::new()),
            conn,
            write_tx: std::sync::Mutex::new(Some(write_tx)),
            writer,
            path: Some(path),
        })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema
    /// cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StoreError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        let conn = Arc::new(Mutex::new(conn));
        let (write_tx, writer) = Self::spawn_writer(Arc::clone(&conn));

        Ok(Self {
            entries: RwLock::new(HashMap::new()),
            conn,
            write_tx: std::sync::Mutex::new(Some(write_tx)),
            writer,
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Populate the in-memory map from the database.
    ///
    /// Called once at startup; returns the number of recovered entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows cannot be read.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let conn = self.conn.clone();
        let rows = tokio::task::spawn_blocking(
            move || -> Result<Vec<(String, EntryKind, DateTime<Utc>)>, StoreError> {
                let conn = conn.blocking_lock();
                let mut stmt = conn.prepare("SELECT path, kind, last_seen FROM files")?;
                let rows = stmt
                    .query_map([], |row| {
                        let path: String = row.get(0)?;
                        let kind: String = row.get(1)?;
                        let last_seen: String = row.get(2)?;
                        Ok((path, kind, last_seen))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(rows
                    .into_iter()
                    .map(|(path, kind, last_seen)| {
                        let last_seen = DateTime::parse_from_rfc3339(&last_seen)
                            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
                        (path, EntryKind::parse(&kind), last_seen)
                    })
                    .collect())
            },
        )
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        let count = rows.len();
        let mut entries = self.entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (path, kind, last_seen) in rows {
            entries.insert(path, (kind, last_seen));
        }
        Ok(count)
    }

    /// Record a path as known. Idempotent; `last_seen` strictly increases
    /// on every call for the same path.
    ///
    /// The memory update always succeeds; the matching durable write is
    /// queued and its failure is logged, never propagated.
    pub fn upsert(&self, path: &str, kind: EntryKind) {
        let last_seen = {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = Utc::now();
            let last_seen = match entries.get(path) {
                Some((_, prev)) if *prev >= now => *prev + Duration::microseconds(1),
                _ => now,
            };
            entries.insert(path.to_string(), (kind, last_seen));
            last_seen
        };

        self.queue_write(WriteOp::Upsert {
            path: path.to_string(),
            kind,
            last_seen,
        });
    }

    /// Forget a path. Removing an absent path is a no-op, not an error.
    pub fn remove(&self, path: &str) {
        let was_known = {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            entries.remove(path).is_some()
        };

        if was_known {
            self.queue_write(WriteOp::Delete {
                path: path.to_string(),
            });
        }
    }

    /// Whether a path is currently known.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(path)
    }

    /// Kind of a known path, or `None` if absent.
    #[must_use]
    pub fn kind_of(&self, path: &str) -> Option<EntryKind> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .map(|(kind, _)| *kind)
    }

    /// Last-seen timestamp of a known path, or `None` if absent.
    #[must_use]
    pub fn last_seen(&self, path: &str) -> Option<DateTime<Utc>> {
        self.entry(path).map(|entry| entry.last_seen)
    }

    /// Full record of a known path, or `None` if absent.
    #[must_use]
    pub fn entry(&self, path: &str) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .map(|(kind, last_seen)| Entry {
                path: path.to_string(),
                kind: *kind,
                last_seen: *last_seen,
            })
    }

    /// Number of known paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all known paths, taken atomically. Reconciliation
    /// passes diff the fresh listing against this snapshot so that live
    /// events arriving mid-pass cannot hide a path from the pass.
    #[must_use]
    pub fn paths_snapshot(&self) -> HashSet<String> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Wait for all queued durable writes to complete.
    ///
    /// Shutdown is not clean until this returns.
    pub async fn close(&self) {
        self.write_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        self.writer.wait().await;
    }

    fn queue_write(&self, op: WriteOp) {
        let tx = self
            .write_tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) if tx.send(op).is_ok() => {}
            _ => {
                tracing::warn!("Store closed; dropping durable write");
            }
        }
    }

    /// Spawn the single writer task that applies queued operations in
    /// the order they were issued. One op commits before the next is
    /// picked up, so an upsert and a removal of the same path can never
    /// land reversed. The task exits once the sender side is dropped
    /// and the queue is drained.
    fn spawn_writer(
        conn: Arc<Mutex<Connection>>,
    ) -> (mpsc::UnboundedSender<WriteOp>, TaskTracker) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteOp>();
        let writer = TaskTracker::new();

        writer.spawn(async move {
            while let Some(op) = rx.recv().await {
                let conn = Arc::clone(&conn);
                let result = tokio::task::spawn_blocking(move || {
                    let conn = conn.blocking_lock();
                    Self::apply_write(&conn, &op)
                })
                .await;

                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Durable write failed; in-memory state remains authoritative");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Durable write task cancelled");
                    }
                }
            }
        });
        writer.close();

        (tx, writer)
    }

    fn apply_write(conn: &Connection, op: &WriteOp) -> Result<(), rusqlite::Error> {
        match op {
            WriteOp::Upsert {
                path,
                kind,
                last_seen,
            } => {
                conn.execute(
                    "INSERT OR REPLACE INTO files (path, kind, last_seen) VALUES (?1, ?2, ?3)",
                    params![path, kind.as_str(), last_seen.to_rfc3339()],
                )?;
            }
            WriteOp::Delete { path } => {
                conn.execute("DELETE FROM files WHERE path = ?1", params![path])?;
            }
        }
        Ok(())
    }
}
