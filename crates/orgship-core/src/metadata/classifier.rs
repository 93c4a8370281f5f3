//! Path classification into metadata entities.

use super::MetadataEntity;
use super::registry::{Layout, SIDECAR_SUFFIX, lookup_folder};

/// Strip the descriptor suffix so a sidecar path names its owning file.
pub fn canonical_path(path: &str) -> &str {
    path.strip_suffix(SIDECAR_SUFFIX).unwrap_or(path)
}

/// Maps repository paths under a source root to metadata entities.
#[derive(Debug, Clone)]
pub struct Classifier {
    source_root: String,
}

impl Classifier {
    /// Create a classifier for the given source root (e.g. `src/`).
    pub fn new(source_root: impl Into<String>) -> Self {
        let mut source_root = source_root.into();
        if !source_root.is_empty() && !source_root.ends_with('/') {
            source_root.push('/');
        }
        Self { source_root }
    }

    pub fn source_root(&self) -> &str {
        &self.source_root
    }

    /// Whether the path lives under the source root.
    pub fn in_source_root(&self, path: &str) -> bool {
        path.starts_with(&self.source_root)
    }

    /// Classify a repository path.
    ///
    /// Returns `None` for paths outside the source root, in unknown folders,
    /// or with a shape the folder's type does not accept. The returned
    /// entity has an empty body.
    pub fn classify(&self, path: &str) -> Option<MetadataEntity> {
        let canonical = canonical_path(path);
        let relative = canonical.strip_prefix(&self.source_root)?;
        let segments: Vec<&str> = relative.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let ty = lookup_folder(segments[0])?;
        let member = match (ty.layout, segments.as_slice()) {
            (Layout::Flat, [_, file]) => stem_with_extension(file, ty.extension)?.to_string(),
            (Layout::Foldered, [_, folder, file]) => match ty.extension {
                Some(_) => format!("{}/{}", folder, stem_with_extension(file, ty.extension)?),
                None => format!("{}/{}", folder, file),
            },
            _ => return None,
        };

        Some(MetadataEntity {
            type_name: ty.name.to_string(),
            member,
            path: canonical.to_string(),
            relative_path: relative.to_string(),
            has_sidecar: ty.has_sidecar,
            destructible: ty.destructible,
            body: Vec::new(),
        })
    }
}

/// Split `Name.ext` and return `Name` when the extension matches.
fn stem_with_extension<'a>(file: &'a str, extension: Option<&str>) -> Option<&'a str> {
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    match extension {
        Some(expected) if expected == ext => Some(stem),
        Some(_) => None,
        None => Some(stem),
    }
}
