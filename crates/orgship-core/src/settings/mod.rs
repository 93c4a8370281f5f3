//! Last-deployed-revision marker kept alongside the org.
//!
//! The marker is read once before resolving the baseline and written once
//! after a successful, non-validate deployment.

mod file;

pub use file::FileSettingsStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the org last received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSettings {
    pub last_deployed_revision: Option<String>,
    pub job_name: Option<String>,
    pub build_number: Option<String>,
    pub deployed_at: Option<DateTime<Utc>>,
}

/// Storage for [`OrgSettings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Option<OrgSettings>>;

    /// Record a deployed revision; the store stamps the time.
    async fn set(&self, revision: &str, job_name: &str, build_number: &str) -> Result<()>;
}
