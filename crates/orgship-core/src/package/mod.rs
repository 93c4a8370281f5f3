//! Deployable archive assembly.
//!
//! An archive holds `package.xml`, `destructiveChanges.xml` when there is
//! something to destroy, and every entity body with its descriptor under the
//! entity's source-root-relative path.

use std::io::{Cursor, Write};

use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};
use crate::manifest::PackageManifest;
use crate::metadata::MetadataEntity;
use crate::vcs::VersionControl;

/// A zipped package ready for submission.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    /// blake3 hex digest of `bytes`
    pub digest: String,
    pub manifest: PackageManifest,
    pub destructive: PackageManifest,
}

impl Archive {
    /// Short digest for log lines.
    pub fn short_digest(&self) -> &str {
        &self.digest[..12.min(self.digest.len())]
    }
}

/// Builds archives whose descriptors are read from one commit.
pub struct ArchiveBuilder<'a, V: ?Sized> {
    vcs: &'a V,
    commit: &'a str,
    api_version: &'a str,
}

impl<'a, V> ArchiveBuilder<'a, V>
where
    V: VersionControl + ?Sized,
{
    pub fn new(vcs: &'a V, commit: &'a str, api_version: &'a str) -> Self {
        Self {
            vcs,
            commit,
            api_version,
        }
    }

    /// Zip the manifests together with the bodies of `entities`.
    ///
    /// A descriptor missing at the builder's commit is left out with a
    /// warning; the org reports the entity as a component failure.
    pub fn build(
        &self,
        entities: &[MetadataEntity],
        manifest: PackageManifest,
        destructive: PackageManifest,
    ) -> Result<Archive> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        zip.start_file(manifest.file_name(), options)?;
        zip.write_all(&manifest.to_xml(self.api_version)?)?;

        if !destructive.is_empty() {
            zip.start_file(destructive.file_name(), options)?;
            zip.write_all(&destructive.to_xml(self.api_version)?)?;
        }

        for entity in entities {
            debug!("Packaging {}", entity.relative_path);
            zip.start_file(entity.relative_path.as_str(), options)?;
            zip.write_all(&entity.body)?;

            if let (Some(sidecar), Some(relative)) =
                (entity.sidecar_path(), entity.sidecar_relative_path())
            {
                match self.vcs.blob(&sidecar, self.commit) {
                    Ok(body) => {
                        zip.start_file(relative, options)?;
                        zip.write_all(&body)?;
                    }
                    Err(Error::ObjectNotFound { .. }) => {
                        warn!("{} has no descriptor at {}", entity.path, self.commit);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        let bytes = zip.finish()?.into_inner();
        let digest = blake3::hash(&bytes).to_hex().to_string();
        info!(
            "Built archive with {} entities ({} bytes, blake3 {})",
            entities.len(),
            bytes.len(),
            &digest[..12]
        );

        Ok(Archive {
            bytes,
            digest,
            manifest,
            destructive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Classifier;
    use crate::vcs::MemoryRepository;
    use std::io::Read;

    fn repo() -> MemoryRepository {
        MemoryRepository::new().with_commit(
            "c1",
            [
                ("src/classes/A.cls", "class A {}"),
                ("src/classes/A.cls-meta.xml", "<ApexClass/>"),
                ("src/objects/Acc.object", "<CustomObject/>"),
            ],
        )
    }

    fn entity(repo: &MemoryRepository, path: &str) -> MetadataEntity {
        let e = Classifier::new("src").classify(path).unwrap();
        let body = repo.blob(&e.path, "c1").unwrap();
        e.with_body(body)
    }

    fn names(bytes: &[u8]) -> Vec<String> {
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn archives_bodies_and_sidecars() {
        let repo = repo();
        let entities = vec![
            entity(&repo, "src/classes/A.cls"),
            entity(&repo, "src/objects/Acc.object"),
        ];
        let manifest = PackageManifest::build(&entities, false);
        let archive = ArchiveBuilder::new(&repo, "c1", "58.0")
            .build(&entities, manifest, PackageManifest::empty())
            .unwrap();

        assert_eq!(
            names(&archive.bytes),
            vec![
                "classes/A.cls",
                "classes/A.cls-meta.xml",
                "objects/Acc.object",
                "package.xml"
            ]
        );
        assert_eq!(archive.digest.len(), 64);

        let mut zip = zip::ZipArchive::new(Cursor::new(&archive.bytes)).unwrap();
        let mut body = String::new();
        zip.by_name("classes/A.cls").unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "class A {}");
    }

    #[test]
    fn destructive_manifest_included_when_non_empty() {
        let repo = repo();
        let gone = vec![entity(&repo, "src/classes/A.cls")];
        let archive = ArchiveBuilder::new(&repo, "c1", "58.0")
            .build(
                &[],
                PackageManifest::empty(),
                PackageManifest::build(&gone, true),
            )
            .unwrap();
        assert_eq!(
            names(&archive.bytes),
            vec!["destructiveChanges.xml", "package.xml"]
        );
    }

    #[test]
    fn missing_sidecar_is_left_out() {
        let repo = MemoryRepository::new().with_commit("c1", [("src/classes/A.cls", "x")]);
        let e = Classifier::new("src")
            .classify("src/classes/A.cls")
            .unwrap()
            .with_body(b"x".to_vec());
        let archive = ArchiveBuilder::new(&repo, "c1", "58.0")
            .build(
                std::slice::from_ref(&e),
                PackageManifest::build([&e], false),
                PackageManifest::empty(),
            )
            .unwrap();
        assert_eq!(names(&archive.bytes), vec!["classes/A.cls", "package.xml"]);
    }
}
