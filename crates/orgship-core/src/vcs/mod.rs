//! Version-control access used to compute change-sets.
//!
//! The resolver only needs four primitives: resolve a revision, read a blob
//! at a commit, diff two commits and list a commit's tree. Fetching and
//! ref management stay with the pipeline that checked the workspace out.

mod git;
mod memory;

pub use git::GitRepository;
pub use memory::MemoryRepository;

use crate::error::Result;

/// Kind of change a diff entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
}

/// One path-level change between two commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub status: DiffStatus,
    /// Path on the old side (absent for additions)
    pub old_path: Option<String>,
    /// Path on the new side (absent for deletions)
    pub new_path: Option<String>,
}

impl DiffEntry {
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            status: DiffStatus::Added,
            old_path: None,
            new_path: Some(path.into()),
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            status: DiffStatus::Deleted,
            old_path: Some(path.into()),
            new_path: None,
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            status: DiffStatus::Modified,
            old_path: Some(path.clone()),
            new_path: Some(path),
        }
    }
}

/// Read-only access to a repository's history.
pub trait VersionControl {
    /// Resolve a revision expression to a full commit id.
    fn resolve(&self, revision: &str) -> Result<String>;

    /// Read a file's bytes at a commit.
    ///
    /// A path missing from the commit's tree is
    /// [`Error::ObjectNotFound`](crate::error::Error::ObjectNotFound).
    fn blob(&self, path: &str, commit: &str) -> Result<Vec<u8>>;

    /// Path-level diff from `old` to `new`, in path order.
    fn diff(&self, old: &str, new: &str) -> Result<Vec<DiffEntry>>;

    /// Every file path in a commit's tree.
    fn list(&self, commit: &str) -> Result<Vec<String>>;
}
