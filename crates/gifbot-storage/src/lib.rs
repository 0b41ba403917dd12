//! Temporary file hosting for GIFs too large to attach.
//!
//! This crate provides:
//! - The `HostUploader` seam used by the output router
//! - A Litterbox client implementing it

pub mod error;
pub mod litterbox;
pub mod uploader;

pub use error::{StorageError, StorageResult};
pub use litterbox::{LitterboxClient, LitterboxConfig};
pub use uploader::HostUploader;
