//! git2-backed repository access.

use std::path::Path;

use git2::{
    Commit, Delta, ErrorCode, ObjectType, Repository, Tree, TreeWalkMode, TreeWalkResult,
};

use super::{DiffEntry, DiffStatus, VersionControl};
use crate::error::{Error, Result};

/// A local git repository opened through libgit2.
pub struct GitRepository {
    repo: Repository,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl GitRepository {
    /// Open the repository containing `workspace`.
    pub fn open(workspace: &Path) -> Result<Self> {
        let repo = Repository::discover(workspace)?;
        Ok(Self { repo })
    }

    fn commit(&self, revision: &str) -> Result<Commit<'_>> {
        let obj = self.repo.revparse_single(revision).map_err(|err| {
            if err.code() == ErrorCode::NotFound {
                Error::revision_not_found(revision)
            } else {
                Error::Vcs(err)
            }
        })?;
        Ok(obj.peel_to_commit()?)
    }

    fn tree(&self, commit: &str) -> Result<Tree<'_>> {
        Ok(self.commit(commit)?.tree()?)
    }
}

impl VersionControl for GitRepository {
    fn resolve(&self, revision: &str) -> Result<String> {
        Ok(self.commit(revision)?.id().to_string())
    }

    fn blob(&self, path: &str, commit: &str) -> Result<Vec<u8>> {
        let tree = self.tree(commit)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(err) if err.code() == ErrorCode::NotFound => {
                return Err(Error::object_not_found(path, commit));
            }
            Err(err) => return Err(err.into()),
        };
        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(blob.content().to_vec())
    }

    fn diff(&self, old: &str, new: &str) -> Result<Vec<DiffEntry>> {
        let old_tree = self.tree(old)?;
        let new_tree = self.tree(new)?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

        let mut entries = Vec::new();
        for delta in diff.deltas() {
            let old_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let new_path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let status = match delta.status() {
                Delta::Added => DiffStatus::Added,
                Delta::Deleted => DiffStatus::Deleted,
                Delta::Modified | Delta::Typechange => DiffStatus::Modified,
                Delta::Renamed => {
                    // Renames only appear with find_similar; split them so
                    // the old member is destroyed and the new one deployed.
                    if let Some(path) = old_path {
                        entries.push(DiffEntry::deleted(path));
                    }
                    if let Some(path) = new_path {
                        entries.push(DiffEntry::added(path));
                    }
                    continue;
                }
                other => {
                    tracing::debug!("Ignoring diff entry with status {:?}", other);
                    continue;
                }
            };
            entries.push(DiffEntry {
                status,
                old_path: (status != DiffStatus::Added).then_some(old_path).flatten(),
                new_path: (status != DiffStatus::Deleted).then_some(new_path).flatten(),
            });
        }
        Ok(entries)
    }

    fn list(&self, commit: &str) -> Result<Vec<String>> {
        let tree = self.tree(commit)?;
        let mut paths = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob)
                && let Some(name) = entry.name()
            {
                paths.push(format!("{}{}", root, name));
            }
            TreeWalkResult::Ok
        })?;
        paths.sort();
        Ok(paths)
    }
}
