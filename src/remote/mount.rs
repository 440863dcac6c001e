//! Listing implementation for a locally mounted share.

use std::path::PathBuf;

use async_trait::async_trait;

use super::error::RemoteError;
use super::lister::{ShareEntry, ShareLister};

/// Lists the root of a network share exposed as a local mount point.
#[derive(Debug, Clone)]
pub struct MountLister {
    root: PathBuf,
}

impl MountLister {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The mount point being listed.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl ShareLister for MountLister {
    async fn list(&self) -> Result<Vec<ShareEntry>, RemoteError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| RemoteError::from_io(&e))?;

        let mut entries = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    // Entries vanishing mid-listing are treated as files;
                    // a later pass or a watch signal corrects the record.
                    let is_directory = entry
                        .file_type()
                        .await
                        .map(|t| t.is_dir())
                        .unwrap_or(false);
                    entries.push(ShareEntry { name, is_directory });
                }
                Ok(None) => break,
                Err(e) => return Err(RemoteError::from_io(&e)),
            }
        }

        Ok(entries)
    }
}
