//! In-memory repository for dry runs and tests.

use std::collections::{BTreeMap, HashMap};

use super::{DiffEntry, VersionControl};
use crate::error::{Error, Result};

/// Snapshot-per-commit repository held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    commits: HashMap<String, BTreeMap<String, Vec<u8>>>,
    refs: HashMap<String, String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit with the full file snapshot.
    pub fn with_commit<I, P, B>(mut self, id: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        let snapshot = files
            .into_iter()
            .map(|(path, body)| (path.into(), body.into()))
            .collect();
        self.commits.insert(id.into(), snapshot);
        self
    }

    /// Point a symbolic name (e.g. `HEAD`) at a commit.
    pub fn with_ref(mut self, name: impl Into<String>, commit: impl Into<String>) -> Self {
        self.refs.insert(name.into(), commit.into());
        self
    }

    fn snapshot(&self, commit: &str) -> Result<&BTreeMap<String, Vec<u8>>> {
        let id = self.resolve(commit)?;
        self.commits
            .get(&id)
            .ok_or_else(|| Error::revision_not_found(commit))
    }
}

impl VersionControl for MemoryRepository {
    fn resolve(&self, revision: &str) -> Result<String> {
        if self.commits.contains_key(revision) {
            return Ok(revision.to_string());
        }
        self.refs
            .get(revision)
            .cloned()
            .ok_or_else(|| Error::revision_not_found(revision))
    }

    fn blob(&self, path: &str, commit: &str) -> Result<Vec<u8>> {
        self.snapshot(commit)?
            .get(path)
            .cloned()
            .ok_or_else(|| Error::object_not_found(path, commit))
    }

    fn diff(&self, old: &str, new: &str) -> Result<Vec<DiffEntry>> {
        let old = self.snapshot(old)?;
        let new = self.snapshot(new)?;

        let mut paths: Vec<&String> = old.keys().chain(new.keys()).collect();
        paths.sort();
        paths.dedup();

        let entries = paths
            .into_iter()
            .filter_map(|path| match (old.get(path), new.get(path)) {
                (None, Some(_)) => Some(DiffEntry::added(path.clone())),
                (Some(_), None) => Some(DiffEntry::deleted(path.clone())),
                (Some(a), Some(b)) if a != b => Some(DiffEntry::modified(path.clone())),
                _ => None,
            })
            .collect();
        Ok(entries)
    }

    fn list(&self, commit: &str) -> Result<Vec<String>> {
        Ok(self.snapshot(commit)?.keys().cloned().collect())
    }
}
