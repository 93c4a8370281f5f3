//! Rollback packages.
//!
//! A rollback archive undoes one diff deployment: it redeploys what was
//! deleted or modified, using the previous commit's contents, and destroys
//! what was added.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::changeset::ChangeSet;
use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::metadata::MetadataEntity;
use crate::package::{Archive, ArchiveBuilder};
use crate::vcs::VersionControl;

/// Builds the inverse of a change-set from the previous commit.
pub struct RollbackBuilder<'a, V: ?Sized> {
    vcs: &'a V,
    previous_commit: &'a str,
    api_version: &'a str,
}

impl<'a, V> RollbackBuilder<'a, V>
where
    V: VersionControl + ?Sized,
{
    pub fn new(vcs: &'a V, previous_commit: &'a str, api_version: &'a str) -> Self {
        Self {
            vcs,
            previous_commit,
            api_version,
        }
    }

    /// Entities the rollback redeploys: destructible deletions, then the old
    /// side of modifications.
    pub fn restore_entities(changes: &ChangeSet) -> Vec<MetadataEntity> {
        changes
            .deletions()
            .values()
            .filter(|e| e.destructible)
            .chain(changes.modified_old().values())
            .cloned()
            .collect()
    }

    pub fn build(&self, changes: &ChangeSet) -> Result<Archive> {
        let restore = Self::restore_entities(changes);
        let manifest = PackageManifest::build(&restore, false);
        let destructive = PackageManifest::build(changes.additions().values(), true);

        ArchiveBuilder::new(self.vcs, self.previous_commit, self.api_version).build(
            &restore,
            manifest,
            destructive,
        )
    }
}

/// `<workspace>/<rollback_dir>/rollback-<job>-<build>.zip`
pub fn rollback_path(
    workspace: &Path,
    rollback_dir: &Path,
    job_name: &str,
    build_number: &str,
) -> PathBuf {
    let job = job_name.replace(['/', '\\'], "_");
    workspace
        .join(rollback_dir)
        .join(format!("rollback-{}-{}.zip", job, build_number))
}

/// Write an archive, creating parent directories.
pub fn write_archive(archive: &Archive, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &archive.bytes)?;
    info!(
        "Wrote rollback package {} (blake3 {})",
        path.display(),
        archive.short_digest()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::resolve_commits;
    use crate::metadata::Classifier;
    use crate::vcs::MemoryRepository;
    use std::io::{Cursor, Read};

    fn repo() -> MemoryRepository {
        MemoryRepository::new()
            .with_commit(
                "old",
                [
                    ("src/classes/A.cls", "class A { v1 }"),
                    ("src/classes/A.cls-meta.xml", "<meta/>"),
                    ("src/classes/Gone.cls", "class Gone {}"),
                    ("src/classes/Gone.cls-meta.xml", "<meta/>"),
                    ("src/profiles/Admin.profile", "<Profile/>"),
                ],
            )
            .with_commit(
                "new",
                [
                    ("src/classes/A.cls", "class A { v2 }"),
                    ("src/classes/A.cls-meta.xml", "<meta/>"),
                    ("src/classes/New.cls", "class New {}"),
                    ("src/classes/New.cls-meta.xml", "<meta/>"),
                ],
            )
    }

    fn read(bytes: &[u8], name: &str) -> String {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        zip.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn inverts_the_change_set() {
        let repo = repo();
        let changes = resolve_commits(&repo, "old", "new", &Classifier::new("src")).unwrap();
        let archive = RollbackBuilder::new(&repo, "old", "58.0")
            .build(&changes)
            .unwrap();

        let members = archive.manifest.types().get("ApexClass").unwrap();
        assert!(members.contains("A"));
        assert!(members.contains("Gone"));
        assert!(!archive.manifest.types().contains_key("Profile"));

        let destroyed = archive.destructive.types().get("ApexClass").unwrap();
        assert_eq!(destroyed.iter().collect::<Vec<_>>(), vec!["New"]);

        assert_eq!(read(&archive.bytes, "classes/A.cls"), "class A { v1 }");
        assert_eq!(read(&archive.bytes, "classes/Gone.cls-meta.xml"), "<meta/>");
        assert!(read(&archive.bytes, "destructiveChanges.xml").contains("<members>New</members>"));
    }

    #[test]
    fn path_layout() {
        assert_eq!(
            rollback_path(Path::new("/ws"), Path::new(".orgship/rollback"), "team/deploy", "7"),
            PathBuf::from("/ws/.orgship/rollback/rollback-team_deploy-7.zip")
        );
    }

    #[test]
    fn writes_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo();
        let changes = resolve_commits(&repo, "old", "new", &Classifier::new("src")).unwrap();
        let archive = RollbackBuilder::new(&repo, "old", "58.0")
            .build(&changes)
            .unwrap();

        let path = rollback_path(dir.path(), Path::new("nested/rollback"), "job", "1");
        write_archive(&archive, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), archive.bytes);
    }
}
