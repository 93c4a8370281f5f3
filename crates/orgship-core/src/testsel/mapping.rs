//! Explicit class to tests mapping read from an XML manifest.
//!
//! ```xml
//! <manifest>
//!     <mappings>
//!         <class>AccountService</class>
//!         <tests>AccountServiceTest</tests>
//!         <tests>IntegrationTest,SmokeTest</tests>
//!     </mappings>
//! </manifest>
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

/// Code entity name to the tests that cover it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTestMapping {
    classes: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    mappings: Vec<RawMapping>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMapping {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    tests: Vec<String>,
}

impl ClassTestMapping {
    /// Parse a mapping document.
    pub fn parse(xml: &str) -> Result<Self> {
        let raw: RawManifest = from_str(xml)?;
        let mut classes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for mapping in raw.mappings {
            let Some(class) = mapping.class.map(|c| c.trim().to_string()) else {
                continue;
            };
            if class.is_empty() {
                continue;
            }
            let tests = classes.entry(class).or_default();
            for value in &mapping.tests {
                tests.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                );
            }
        }

        Ok(Self { classes })
    }

    /// Load the mapping, degrading to `None` when the file is missing or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(
                    "Error found while loading test manifest '{}': {}",
                    path.display(),
                    err
                );
                return None;
            }
        };
        match Self::parse(&content) {
            Ok(mapping) => {
                debug!(
                    "Loaded test manifest '{}' with {} classes",
                    path.display(),
                    mapping.classes.len()
                );
                Some(mapping)
            }
            Err(err) => {
                warn!(
                    "Error found in the document structure of test manifest '{}': {}",
                    path.display(),
                    err
                );
                None
            }
        }
    }

    /// Tests mapped to `class`, if the class is listed.
    pub fn tests_for(&self, class: &str) -> Option<&BTreeSet<String>> {
        self.classes.get(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<C, I> FromIterator<(C, I)> for ClassTestMapping
where
    C: Into<String>,
    I: IntoIterator,
    I::Item: Into<String>,
{
    fn from_iter<It: IntoIterator<Item = (C, I)>>(iter: It) -> Self {
        let mut classes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (class, tests) in iter {
            classes
                .entry(class.into())
                .or_default()
                .extend(tests.into_iter().map(Into::into));
        }
        Self { classes }
    }
}
