//! The drive tree: folder structure and stored file bytes.
//!
//! [`ResourceHierarchy`] applies structural rules (system root protection,
//! non-empty folder conflicts, recursive child deletion) over any
//! [`database::CredentialStore`]. [`FileStore`] keeps the bytes of file
//! resources on disk.

pub mod error;
pub mod files;
pub mod hierarchy;

pub use error::{DriveError, Result};
pub use files::{sanitize_file_name, FileStore, StoredFile};
pub use hierarchy::{FolderDeletion, ResourceHierarchy};
