//! Package manifests listing the members to deploy or destroy.
//!
//! Types and members are kept in ordered collections so the serialized XML
//! is byte-for-byte reproducible across runs.

mod xml;

pub use xml::METADATA_NAMESPACE;

use std::collections::{BTreeMap, BTreeSet};

use crate::metadata::MetadataEntity;

/// File name of the forward manifest inside an archive.
pub const PACKAGE_FILE: &str = "package.xml";
/// File name of the destructive manifest inside an archive.
pub const DESTRUCTIVE_FILE: &str = "destructiveChanges.xml";

/// Members grouped by metadata type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    destructive: bool,
    types: BTreeMap<String, BTreeSet<String>>,
}

impl PackageManifest {
    /// Group entities by type.
    ///
    /// A destructive manifest silently drops entities whose type may not be
    /// destroyed.
    pub fn build<'a, I>(entities: I, destructive: bool) -> Self
    where
        I: IntoIterator<Item = &'a MetadataEntity>,
    {
        let mut types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entity in entities {
            if destructive && !entity.destructible {
                tracing::debug!(
                    "Leaving {} {} out of destructive manifest",
                    entity.type_name,
                    entity.member
                );
                continue;
            }
            types
                .entry(entity.type_name.clone())
                .or_default()
                .insert(entity.member.clone());
        }
        Self { destructive, types }
    }

    /// An empty forward manifest.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.values().all(BTreeSet::is_empty)
    }

    /// Type name to members, in output order.
    pub fn types(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.types
    }

    /// Name of this manifest inside an archive.
    pub fn file_name(&self) -> &'static str {
        if self.destructive {
            DESTRUCTIVE_FILE
        } else {
            PACKAGE_FILE
        }
    }

    /// Human-readable `Type: member` lines.
    pub fn describe(&self) -> Vec<String> {
        self.types
            .iter()
            .flat_map(|(ty, members)| members.iter().map(move |m| format!("{}: {}", ty, m)))
            .collect()
    }
}

/// Whether any entity is executable code.
pub fn contains_code<'a, I>(entities: I) -> bool
where
    I: IntoIterator<Item = &'a MetadataEntity>,
{
    entities.into_iter().any(MetadataEntity::is_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Classifier;

    fn entities(paths: &[&str]) -> Vec<MetadataEntity> {
        let c = Classifier::new("src");
        paths.iter().map(|p| c.classify(p).unwrap()).collect()
    }

    #[test]
    fn destructive_manifest_drops_non_destructible() {
        let list = entities(&["src/classes/A.cls", "src/profiles/Admin.profile"]);

        let forward = PackageManifest::build(&list, false);
        assert_eq!(forward.types().len(), 2);

        let destructive = PackageManifest::build(&list, true);
        assert_eq!(destructive.types().len(), 1);
        assert!(destructive.types().contains_key("ApexClass"));
        assert_eq!(destructive.file_name(), "destructiveChanges.xml");
    }

    #[test]
    fn duplicate_members_collapse() {
        let list = entities(&["src/classes/A.cls", "src/classes/A.cls-meta.xml"]);
        let manifest = PackageManifest::build(&list, false);
        assert_eq!(manifest.types()["ApexClass"].len(), 1);
    }

    #[test]
    fn detects_code() {
        assert!(contains_code(&entities(&["src/triggers/T.trigger"])));
        assert!(!contains_code(&entities(&["src/pages/P.page"])));
        assert!(!contains_code(&Vec::<MetadataEntity>::new()));
    }

    #[test]
    fn describe_lists_sorted_members() {
        let list = entities(&["src/pages/Z.page", "src/classes/B.cls", "src/classes/A.cls"]);
        assert_eq!(
            PackageManifest::build(&list, false).describe(),
            vec!["ApexClass: A", "ApexClass: B", "ApexPage: Z"]
        );
    }
}
