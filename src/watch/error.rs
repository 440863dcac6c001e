//! Watch error types.

/// Errors that can occur during share watching.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
