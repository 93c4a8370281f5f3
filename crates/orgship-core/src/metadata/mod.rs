//! Metadata entities and path classification.
//!
//! A repository file under the source root maps to at most one deployable
//! entity, identified by its metadata type and member name.

pub mod classifier;
pub mod registry;

pub use classifier::{Classifier, canonical_path};
pub use registry::{CODE_TYPES, MetadataType, SIDECAR_SUFFIX, lookup_folder};

use std::collections::BTreeSet;

/// One deployable unit of org metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntity {
    /// Metadata type name (e.g. `ApexClass`)
    pub type_name: String,
    /// Member name, unique within the type
    pub member: String,
    /// Repository-relative path of the entity's main file
    pub path: String,
    /// Path relative to the source root, used inside archives
    pub relative_path: String,
    /// Whether a `-meta.xml` descriptor travels with the file
    pub has_sidecar: bool,
    /// Whether the type may appear in a destructive manifest
    pub destructible: bool,
    /// File contents at the commit the entity was resolved from
    pub body: Vec<u8>,
}

impl MetadataEntity {
    /// Attach the file contents.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Repository path of the descriptor file, if this type has one.
    pub fn sidecar_path(&self) -> Option<String> {
        self.has_sidecar
            .then(|| format!("{}{}", self.path, SIDECAR_SUFFIX))
    }

    /// Archive path of the descriptor file, if this type has one.
    pub fn sidecar_relative_path(&self) -> Option<String> {
        self.has_sidecar
            .then(|| format!("{}{}", self.relative_path, SIDECAR_SUFFIX))
    }

    /// Whether this entity is executable code.
    pub fn is_code(&self) -> bool {
        CODE_TYPES.contains(&self.type_name.as_str())
    }
}

/// Member names of every executable-code entity in the list.
pub fn code_members(entities: &[MetadataEntity]) -> BTreeSet<String> {
    entities
        .iter()
        .filter(|e| e.is_code())
        .map(|e| e.member.clone())
        .collect()
}
