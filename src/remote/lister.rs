//! The listing seam between the engine and the share access layer.

use async_trait::async_trait;

use super::error::RemoteError;

/// One entry of a share listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEntry {
    /// Name of the entry relative to the share root.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

impl ShareEntry {
    #[must_use]
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// Lists the contents of the share root.
///
/// A protocol-level client (SMB, NFS) slots in behind this trait; the
/// default implementation reads a locally mounted share.
#[async_trait]
pub trait ShareLister: Send + Sync {
    /// Produce a fresh listing of the share root.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] classified per the taxonomy; the caller
    /// treats every variant as terminal for the attempt only.
    async fn list(&self) -> Result<Vec<ShareEntry>, RemoteError>;
}
