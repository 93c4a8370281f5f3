//! Classified result of diffing two repository snapshots.
//!
//! A [`ChangeSet`] is computed once per run by the [`resolver`] and then
//! only read. Each category maps the logical (sidecar-stripped) path of an
//! entity to the entity with its body attached.

pub mod resolver;

pub use resolver::{resolve, resolve_commits, resolve_full};

use std::collections::BTreeMap;

use crate::metadata::MetadataEntity;

/// Additions, deletions and both sides of modifications under the source root.
///
/// A logical path is in at most one of added, deleted or modified.
/// `modified_new` and `modified_old` always share their keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub(crate) additions: BTreeMap<String, MetadataEntity>,
    pub(crate) deletions: BTreeMap<String, MetadataEntity>,
    pub(crate) modified_new: BTreeMap<String, MetadataEntity>,
    pub(crate) modified_old: BTreeMap<String, MetadataEntity>,
}

impl ChangeSet {
    /// Entities added, bodies from the new commit.
    pub fn additions(&self) -> &BTreeMap<String, MetadataEntity> {
        &self.additions
    }

    /// Entities deleted, bodies from the old commit.
    pub fn deletions(&self) -> &BTreeMap<String, MetadataEntity> {
        &self.deletions
    }

    /// New side of modified entities.
    pub fn modified_new(&self) -> &BTreeMap<String, MetadataEntity> {
        &self.modified_new
    }

    /// Old side of modified entities.
    pub fn modified_old(&self) -> &BTreeMap<String, MetadataEntity> {
        &self.modified_old
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty() && self.modified_new.is_empty()
    }

    /// Everything the forward deployment pushes: additions then modifications.
    pub fn deploy_entities(&self) -> Vec<MetadataEntity> {
        self.additions
            .values()
            .chain(self.modified_new.values())
            .cloned()
            .collect()
    }

    /// Everything the forward deployment destroys.
    pub fn delete_entities(&self) -> Vec<MetadataEntity> {
        self.deletions.values().cloned().collect()
    }

    // Each insert keeps the three kinds disjoint. A collision across kinds
    // comes from a file and its sidecar landing in different diff statuses.

    pub(crate) fn insert_added(&mut self, path: String, entity: MetadataEntity) {
        if let Some(old) = self.deletions.remove(&path) {
            self.modified_old.insert(path.clone(), old);
            self.modified_new.insert(path, entity);
            return;
        }
        self.modified_new.remove(&path);
        self.modified_old.remove(&path);
        self.additions.insert(path, entity);
    }

    pub(crate) fn insert_deleted(&mut self, path: String, entity: MetadataEntity) {
        if let Some(new) = self.additions.remove(&path) {
            self.modified_new.insert(path.clone(), new);
            self.modified_old.insert(path, entity);
            return;
        }
        self.modified_new.remove(&path);
        self.modified_old.remove(&path);
        self.deletions.insert(path, entity);
    }

    pub(crate) fn insert_modified(&mut self, path: String, new: MetadataEntity, old: MetadataEntity) {
        if let Some(added) = self.additions.get_mut(&path) {
            *added = new;
            return;
        }
        if let Some(deleted) = self.deletions.get_mut(&path) {
            *deleted = old;
            return;
        }
        self.modified_new.insert(path.clone(), new);
        self.modified_old.insert(path, old);
    }
}
