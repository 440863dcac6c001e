//! Remote share access: listing the share root and classifying failures.

mod error;
mod lister;
mod mount;

pub use error::RemoteError;
pub use lister::{ShareEntry, ShareLister};
pub use mount::MountLister;
