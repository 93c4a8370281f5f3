//! Test selection for `RunSpecifiedTests` deployments.
//!
//! Each code entity being deployed gets its tests from two sources: the
//! naming convention (`FooTest` covers `Foo`) and an optional explicit
//! mapping document. The union is restricted to classes that actually exist
//! in the repository.

mod mapping;

pub use mapping::ClassTestMapping;

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default naming convention for test classes.
pub const DEFAULT_TEST_REGEX: &str = ".*[T|t]est.*";

/// Selects tests from a naming regex and an optional mapping.
#[derive(Debug, Clone)]
pub struct TestSelector {
    pattern: Option<String>,
    naming: Option<Regex>,
    mapping: Option<ClassTestMapping>,
}

impl TestSelector {
    /// Compile the naming regex. An empty pattern disables naming inference.
    pub fn new(naming_regex: &str) -> Result<Self> {
        if naming_regex.is_empty() {
            return Ok(Self {
                pattern: None,
                naming: None,
                mapping: None,
            });
        }
        let naming = full_match(naming_regex)?;
        Ok(Self {
            pattern: Some(naming_regex.to_string()),
            naming: Some(naming),
            mapping: None,
        })
    }

    /// Attach an explicit class to tests mapping.
    pub fn with_mapping(mut self, mapping: Option<ClassTestMapping>) -> Self {
        self.mapping = mapping;
        self
    }

    /// Tests required by `to_deploy`, drawn from `inventory`.
    ///
    /// `inventory` is every code entity in the repository; anything outside
    /// it is dropped from the result.
    pub fn select(
        &self,
        to_deploy: &BTreeSet<String>,
        inventory: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut selected = BTreeSet::new();

        for class in to_deploy {
            let mut tests = BTreeSet::new();

            if let Some(test) = self.infer(class, inventory)? {
                tests.insert(test);
            }
            if let Some(mapped) = self.mapping.as_ref().and_then(|m| m.tests_for(class)) {
                tests.extend(mapped.iter().cloned());
            }

            if tests.is_empty() {
                warn!("No test class for {} found", class);
                continue;
            }
            debug!("Tests for {}: {:?}", class, tests);
            selected.extend(tests);
        }

        selected.retain(|t| inventory.contains(t));
        Ok(selected)
    }

    fn infer(&self, class: &str, inventory: &BTreeSet<String>) -> Result<Option<String>> {
        let (Some(pattern), Some(naming)) = (&self.pattern, &self.naming) else {
            return Ok(None);
        };
        if naming.is_match(class) {
            return Ok(Some(class.to_string()));
        }

        let name = regex::escape(class);
        for candidate in [
            format!("{}(?:{})", name, pattern),
            format!("(?:{}){}", pattern, name),
        ] {
            let re = full_match(&candidate)?;
            if let Some(found) = inventory.iter().find(|c| re.is_match(c)) {
                return Ok(Some(found.clone()));
            }
        }
        Ok(None)
    }
}

/// Convenience wrapper over [`TestSelector`].
pub fn select_tests(
    to_deploy: &BTreeSet<String>,
    inventory: &BTreeSet<String>,
    naming_regex: &str,
    mapping: Option<&ClassTestMapping>,
) -> Result<BTreeSet<String>> {
    TestSelector::new(naming_regex)?
        .with_mapping(mapping.cloned())
        .select(to_deploy, inventory)
}

fn full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| Error::config(format!("Invalid test regex '{}': {}", pattern, e)))
}
