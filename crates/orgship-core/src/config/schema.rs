//! Configuration schema for orgship.toml
//!
//! ```toml
//! [org]
//! login_url = "https://test.salesforce.com"
//! username = "ci@acme.com"
//! client_id = "3MVG9..."
//! api_version = "58.0"
//!
//! [deploy]
//! source_root = "src/"
//! test_level = "RunSpecifiedTests"
//!
//! [tests]
//! regex = ".*[T|t]est.*"
//! manifest = "tests.xml"
//!
//! [settings]
//! backend = "org"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::deploy::{PollSettings, TestLevel};
use crate::error::{Error, Result as CoreResult};
use crate::remote::Credentials;
use crate::testsel::DEFAULT_TEST_REGEX;

/// Root configuration structure for orgship.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OrgshipConfig {
    /// Connection to the target org
    #[serde(default)]
    pub org: OrgConfig,

    /// Packaging and polling
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Test selection
    #[serde(default)]
    pub tests: TestsConfig,

    /// Where the last deployed revision is kept
    #[serde(default)]
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrgConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default)]
    pub username: Option<String>,

    /// Prefer ORGSHIP_PASSWORD over storing this in the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// HTTP(S) proxy for all org traffic
    #[serde(default)]
    pub proxy_url: Option<String>,
}

fn default_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_api_version() -> String {
    "58.0".to_string()
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            username: None,
            password: None,
            security_token: None,
            client_id: None,
            client_secret: None,
            api_version: default_api_version(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployConfig {
    /// Repository prefix holding the metadata
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Milliseconds between status checks
    #[serde(default = "default_poll_wait_ms")]
    pub poll_wait_ms: u64,

    /// Status checks before giving up
    #[serde(default = "default_max_poll")]
    pub max_poll: u32,

    #[serde(default)]
    pub test_level: TestLevel,

    #[serde(default)]
    pub validate_only: bool,

    /// Directory for rollback archives, relative to the workspace
    #[serde(default = "default_rollback_dir")]
    pub rollback_dir: PathBuf,
}

fn default_source_root() -> String {
    "src/".to_string()
}

fn default_poll_wait_ms() -> u64 {
    30_000
}

fn default_max_poll() -> u32 {
    200
}

fn default_rollback_dir() -> PathBuf {
    PathBuf::from(".orgship/rollback")
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            poll_wait_ms: default_poll_wait_ms(),
            max_poll: default_max_poll(),
            test_level: TestLevel::default(),
            validate_only: false,
            rollback_dir: default_rollback_dir(),
        }
    }
}

impl DeployConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: std::time::Duration::from_millis(self.poll_wait_ms),
            max_attempts: self.max_poll,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestsConfig {
    /// Naming convention of test classes; empty disables inference
    #[serde(default = "default_test_regex")]
    pub regex: String,

    /// Optional class to tests mapping, relative to the workspace
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

fn default_test_regex() -> String {
    DEFAULT_TEST_REGEX.to_string()
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            regex: default_test_regex(),
            manifest: None,
        }
    }
}

/// Storage for the last-deployed-revision marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettingsBackend {
    /// Baseline comes from the pipeline's previous successful commit
    #[default]
    None,
    /// JSON file in the workspace
    File,
    /// Custom setting record in the org
    Org,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SettingsConfig {
    #[serde(default)]
    pub backend: SettingsBackend,

    /// File for the `file` backend, relative to the workspace
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SettingsConfig {
    pub fn is_enabled(&self) -> bool {
        self.backend != SettingsBackend::None
    }

    pub fn file_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(
            self.path
                .clone()
                .unwrap_or_else(|| PathBuf::from(".orgship/settings.json")),
        )
    }
}

impl OrgshipConfig {
    /// Create a configuration with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.org.login_url)
            .with_context(|| format!("Invalid login_url '{}'", self.org.login_url))?;

        if let Some(proxy) = &self.org.proxy_url {
            Url::parse(proxy).with_context(|| format!("Invalid proxy_url '{}'", proxy))?;
        }

        let version_ok = self
            .org
            .api_version
            .split_once('.')
            .is_some_and(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
            });
        if !version_ok {
            bail!(
                "Invalid api_version '{}': expected a version like \"58.0\"",
                self.org.api_version
            );
        }

        if self.deploy.source_root.trim_matches('/').is_empty() {
            bail!("deploy.source_root must not be empty");
        }
        if self.deploy.poll_wait_ms == 0 {
            bail!("deploy.poll_wait_ms must be greater than zero");
        }
        if self.deploy.max_poll == 0 {
            bail!("deploy.max_poll must be greater than zero");
        }

        if !self.tests.regex.is_empty() {
            regex::Regex::new(&self.tests.regex)
                .with_context(|| format!("Invalid tests.regex '{}'", self.tests.regex))?;
        }

        Ok(())
    }

    /// Credentials for logging in, failing on anything missing.
    pub fn credentials(&self) -> CoreResult<Credentials> {
        fn required(value: &Option<String>, key: &str) -> CoreResult<String> {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| Error::config(format!("Missing org.{} for login", key)))
        }

        let login_url = Url::parse(&self.org.login_url)
            .map_err(|e| Error::config(format!("Invalid login_url: {}", e)))?;
        let proxy = self
            .org
            .proxy_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| Error::config(format!("Invalid proxy_url: {}", e)))?;

        Ok(Credentials {
            login_url,
            username: required(&self.org.username, "username")?,
            password: required(&self.org.password, "password")?,
            security_token: self.org.security_token.clone().filter(|t| !t.is_empty()),
            client_id: required(&self.org.client_id, "client_id")?,
            client_secret: required(&self.org.client_secret, "client_secret")?,
            proxy,
        })
    }
}
