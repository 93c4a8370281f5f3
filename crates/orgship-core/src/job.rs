//! Pipeline job context and baseline resolution.
//!
//! A run either deploys the whole source tree or the diff between a
//! previous commit and the current one. Which commit counts as "previous"
//! depends on the org settings marker, the pipeline's own bookkeeping and
//! a couple of overrides.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::settings::OrgSettings;

pub const ENV_WORKSPACE: &str = "WORKSPACE";
pub const ENV_JOB_NAME: &str = "JOB_NAME";
pub const ENV_BUILD_NUMBER: &str = "BUILD_NUMBER";
pub const ENV_CURRENT_COMMIT: &str = "GIT_COMMIT";
pub const ENV_PREVIOUS_SUCCESSFUL_COMMIT: &str = "GIT_PREVIOUS_SUCCESSFUL_COMMIT";
pub const ENV_DEPLOY_ALL: &str = "ORGSHIP_DEPLOY_ALL";
pub const ENV_PREVIOUS_COMMIT: &str = "ORGSHIP_PREVIOUS_COMMIT";
pub const ENV_PR_TARGET_BRANCH: &str = "ORGSHIP_PR_TARGET_BRANCH";

/// Facts about the pipeline run that triggered a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobContext {
    pub workspace: PathBuf,
    pub job_name: String,
    pub build_number: String,
    /// Revision being deployed; `HEAD` when unset
    pub current_revision: Option<String>,
    /// Last commit the pipeline built successfully
    pub previous_successful_commit: Option<String>,
    /// Forces (or suppresses) a full deployment
    pub deploy_all: Option<bool>,
    /// Diff against this commit regardless of other sources
    pub previous_commit: Option<String>,
    /// Pull-request validation against `origin/<branch>`
    pub pr_target_branch: Option<String>,
}

impl JobContext {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            job_name: "local".to_string(),
            build_number: "0".to_string(),
            ..Self::default()
        }
    }

    /// Read the context from process environment variables.
    pub fn from_env(default_workspace: &Path) -> Self {
        Self::from_vars(std::env::vars().collect(), default_workspace)
    }

    /// Read the context from a variable map.
    pub fn from_vars(vars: HashMap<String, String>, default_workspace: &Path) -> Self {
        let get = |key: &str| vars.get(key).cloned();
        let non_empty = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();

        let mut ctx = Self::new(
            non_empty(ENV_WORKSPACE)
                .map(PathBuf::from)
                .unwrap_or_else(|| default_workspace.to_path_buf()),
        );
        if let Some(job) = non_empty(ENV_JOB_NAME) {
            ctx.job_name = job;
        }
        if let Some(build) = non_empty(ENV_BUILD_NUMBER) {
            ctx.build_number = build;
        }
        ctx.current_revision = non_empty(ENV_CURRENT_COMMIT);
        ctx.previous_successful_commit = get(ENV_PREVIOUS_SUCCESSFUL_COMMIT);
        ctx.deploy_all = get(ENV_DEPLOY_ALL).map(|v| v.trim().eq_ignore_ascii_case("true"));
        ctx.previous_commit = get(ENV_PREVIOUS_COMMIT);
        ctx.pr_target_branch = get(ENV_PR_TARGET_BRANCH);
        ctx
    }

    pub fn with_deploy_all(mut self, deploy_all: bool) -> Self {
        self.deploy_all = Some(deploy_all);
        self
    }

    pub fn with_previous_commit(mut self, commit: impl Into<String>) -> Self {
        self.previous_commit = Some(commit.into());
        self
    }

    pub fn with_pr_target_branch(mut self, branch: impl Into<String>) -> Self {
        self.pr_target_branch = Some(branch.into());
        self
    }

    pub fn current_revision(&self) -> &str {
        self.current_revision.as_deref().unwrap_or("HEAD")
    }
}

/// What a run deploys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Every entity under the source root
    DeployAll,
    /// Changes since `previous` (a revision expression)
    Diff { previous: String },
}

impl Baseline {
    pub fn is_deploy_all(&self) -> bool {
        matches!(self, Baseline::DeployAll)
    }

    pub fn previous(&self) -> Option<&str> {
        match self {
            Baseline::DeployAll => None,
            Baseline::Diff { previous } => Some(previous),
        }
    }
}

/// Decide deploy-all versus diff and the commit to diff against.
///
/// `marker` is only consulted when the settings backend is enabled; with it
/// disabled the pipeline's previous successful commit is used instead.
pub fn resolve_baseline(
    ctx: &JobContext,
    settings_enabled: bool,
    marker: Option<&OrgSettings>,
) -> Result<Baseline> {
    let mut previous: Option<String> = None;
    let mut deploy_all = false;

    let marked = marker.and_then(|m| m.last_deployed_revision.clone());
    if settings_enabled && marked.is_some() {
        previous = marked;
    } else if !settings_enabled && ctx.previous_successful_commit.is_some() {
        previous = ctx.previous_successful_commit.clone();
    } else {
        deploy_all = true;
    }

    if let Some(flag) = ctx.deploy_all {
        deploy_all = flag;
    }

    let overridden = match ctx.previous_commit.as_deref() {
        Some(commit) if !commit.is_empty() => {
            debug!("Previous commit overridden to {}", commit);
            previous = Some(commit.to_string());
            true
        }
        _ => false,
    };

    if !overridden
        && let Some(branch) = ctx.pr_target_branch.as_deref().filter(|b| !b.is_empty())
    {
        info!("Pull request mode, diffing against origin/{}", branch);
        return Ok(Baseline::Diff {
            previous: format!("origin/{}", branch),
        });
    }

    if deploy_all {
        info!("Deploying all metadata");
        return Ok(Baseline::DeployAll);
    }

    match previous {
        Some(previous) if !previous.is_empty() => {
            info!("Diffing against {}", previous);
            Ok(Baseline::Diff { previous })
        }
        _ => Err(Error::config(
            "No previous commit to diff against; set a previous commit or deploy all",
        )),
    }
}
