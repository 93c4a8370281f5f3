//! Turns a commit diff into a [`ChangeSet`].

use tracing::{debug, info};

use super::ChangeSet;
use crate::error::{Error, Result};
use crate::metadata::{Classifier, MetadataEntity, canonical_path};
use crate::vcs::{DiffEntry, DiffStatus, VersionControl};

/// Diff `old..new` and resolve the entries.
pub fn resolve_commits<V>(
    vcs: &V,
    old: &str,
    new: &str,
    classifier: &Classifier,
) -> Result<ChangeSet>
where
    V: VersionControl + ?Sized,
{
    let entries = vcs.diff(old, new)?;
    debug!("Diff {}..{} has {} entries", old, new, entries.len());
    resolve(vcs, &entries, old, new, classifier)
}

/// Classify each diff entry and attach the bytes of its logical path.
///
/// Entries outside the source root or of unknown type are dropped. Later
/// entries win within a category. A sidecar entry stands for its owning
/// entity, so its category comes from whether the owner exists on each side.
pub fn resolve<V>(
    vcs: &V,
    entries: &[DiffEntry],
    old: &str,
    new: &str,
    classifier: &Classifier,
) -> Result<ChangeSet>
where
    V: VersionControl + ?Sized,
{
    let mut changes = ChangeSet::default();

    for entry in entries {
        if let Some(path) = entry.new_path.as_deref().or(entry.old_path.as_deref())
            && canonical_path(path) != path
        {
            resolve_sidecar(vcs, classifier, path, old, new, &mut changes)?;
            continue;
        }
        match entry.status {
            DiffStatus::Added => {
                if let Some((key, entity)) = load(vcs, classifier, entry.new_path.as_deref(), new)? {
                    changes.insert_added(key, entity);
                }
            }
            DiffStatus::Deleted => {
                if let Some((key, entity)) = load(vcs, classifier, entry.old_path.as_deref(), old)? {
                    changes.insert_deleted(key, entity);
                }
            }
            DiffStatus::Modified => {
                let new_side = load(vcs, classifier, entry.new_path.as_deref(), new)?;
                let old_side = load(vcs, classifier, entry.old_path.as_deref(), old)?;
                match (new_side, old_side) {
                    (Some((key, new_entity)), Some((_, old_entity))) => {
                        changes.insert_modified(key, new_entity, old_entity);
                    }
                    (Some((key, entity)), None) => changes.insert_added(key, entity),
                    (None, Some((key, entity))) => changes.insert_deleted(key, entity),
                    (None, None) => {}
                }
            }
        }
    }

    info!(
        "Resolved change-set: {} added, {} deleted, {} modified",
        changes.additions.len(),
        changes.deletions.len(),
        changes.modified_new.len()
    );
    Ok(changes)
}

/// Every entity under the source root at `commit`, as additions.
pub fn resolve_full<V>(vcs: &V, commit: &str, classifier: &Classifier) -> Result<ChangeSet>
where
    V: VersionControl + ?Sized,
{
    let mut changes = ChangeSet::default();
    for path in vcs.list(commit)? {
        if !classifier.in_source_root(&path) {
            continue;
        }
        let key = canonical_path(&path);
        if changes.additions.contains_key(key) {
            continue;
        }
        if let Some((key, entity)) = load(vcs, classifier, Some(&path), commit)? {
            changes.additions.insert(key, entity);
        }
    }
    info!(
        "Resolved full source tree at {}: {} entities",
        commit,
        changes.additions.len()
    );
    Ok(changes)
}

fn resolve_sidecar<V>(
    vcs: &V,
    classifier: &Classifier,
    path: &str,
    old: &str,
    new: &str,
    changes: &mut ChangeSet,
) -> Result<()>
where
    V: VersionControl + ?Sized,
{
    let Some(entity) = classifier.classify(path) else {
        debug!("Skipping {}", path);
        return Ok(());
    };
    let key = entity.path.clone();
    let after = existing_blob(vcs, &key, new)?;
    let before = existing_blob(vcs, &key, old)?;
    match (after, before) {
        (Some(after), Some(before)) => {
            let old_entity = entity.clone().with_body(before);
            changes.insert_modified(key, entity.with_body(after), old_entity);
        }
        (Some(after), None) => changes.insert_added(key, entity.with_body(after)),
        (None, Some(before)) => changes.insert_deleted(key, entity.with_body(before)),
        (None, None) => return Err(Error::object_not_found(key, new)),
    }
    Ok(())
}

fn existing_blob<V>(vcs: &V, path: &str, commit: &str) -> Result<Option<Vec<u8>>>
where
    V: VersionControl + ?Sized,
{
    match vcs.blob(path, commit) {
        Ok(body) => Ok(Some(body)),
        Err(Error::ObjectNotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

fn load<V>(
    vcs: &V,
    classifier: &Classifier,
    path: Option<&str>,
    commit: &str,
) -> Result<Option<(String, MetadataEntity)>>
where
    V: VersionControl + ?Sized,
{
    let Some(path) = path else {
        return Ok(None);
    };
    let Some(entity) = classifier.classify(path) else {
        debug!("Skipping {}", path);
        return Ok(None);
    };
    let body = vcs.blob(&entity.path, commit)?;
    Ok(Some((entity.path.clone(), entity.with_body(body))))
}
