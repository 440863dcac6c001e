//! Remote access error taxonomy.
//!
//! The poll scheduler keys its logging and retry behavior off these
//! variants; no variant is fatal to the process.

use std::io::ErrorKind;

/// Errors surfaced by the remote listing call.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    /// Share unreachable. Logged and retried next cycle.
    #[error("Share unreachable: {0}")]
    Connection(String),

    /// Credentials rejected. Logged prominently and retried next cycle,
    /// since credentials may be rotated externally.
    #[error("Logon failure: {0}")]
    Auth(String),

    /// Timeout, name resolution, already-connected. Logged at low
    /// severity and ignored.
    #[error("Transient remote error: {0}")]
    Transient(String),

    /// Anything else.
    #[error("Remote listing failed: {0}")]
    Other(String),
}

impl RemoteError {
    /// Classify an I/O error from a mounted share into the taxonomy.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => Self::Connection(err.to_string()),
            ErrorKind::PermissionDenied => Self::Auth(err.to_string()),
            ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted => {
                Self::Transient(err.to_string())
            }
            _ => Self::Other(err.to_string()),
        }
    }
}
