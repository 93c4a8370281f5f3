//! JSON file settings store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{OrgSettings, SettingsStore};
use crate::error::Result;

/// Keeps the marker in a JSON file, typically next to the workspace.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> Result<Option<OrgSettings>> {
        if !self.path.exists() {
            debug!("No settings file at {}", self.path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn set(&self, revision: &str, job_name: &str, build_number: &str) -> Result<()> {
        let settings = OrgSettings {
            last_deployed_revision: Some(revision.to_string()),
            job_name: Some(job_name.to_string()),
            build_number: Some(build_number.to_string()),
            deployed_at: Some(Utc::now()),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&self.path, json)?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_has_no_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("state/settings.json"));
        store.set("abc123", "deploy-prod", "42").await.unwrap();

        let settings = store.get().await.unwrap().unwrap();
        assert_eq!(settings.last_deployed_revision.as_deref(), Some("abc123"));
        assert_eq!(settings.job_name.as_deref(), Some("deploy-prod"));
        assert_eq!(settings.build_number.as_deref(), Some("42"));
        assert!(settings.deployed_at.is_some());
    }
}
