//! Deploy command implementation.
//!
//! One run: read the settings marker, prepare the archive, deploy it, then
//! on success write the coverage report, the rollback package and the new
//! marker. The report always ends with the verdict line.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::prepare::{PreparedRun, prepare_run};
use crate::config::OrgshipConfig;
use crate::deploy::report::{coverage_lines, failure_lines, verdict_line};
use crate::deploy::{DeployService, DeploymentOutcome, DeploymentRequest, Orchestrator};
use crate::error::Result;
use crate::job::JobContext;
use crate::rollback::{RollbackBuilder, rollback_path, write_archive};
use crate::settings::SettingsStore;
use crate::vcs::VersionControl;

/// Result of a deploy run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub success: bool,
    pub validate_only: bool,
    /// Consolidated report; the last line is the verdict
    pub lines: Vec<String>,
    pub outcome: DeploymentOutcome,
    /// Where the rollback package was written, if one was
    pub rollback: Option<PathBuf>,
}

impl RunReport {
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs one deployment end to end.
pub struct DeployCommand<'a, V: ?Sized, S: ?Sized> {
    vcs: &'a V,
    service: &'a S,
    settings: Option<&'a dyn SettingsStore>,
    config: &'a OrgshipConfig,
    ctx: &'a JobContext,
    cancel: CancellationToken,
}

impl<'a, V, S> DeployCommand<'a, V, S>
where
    V: VersionControl + ?Sized,
    S: DeployService + ?Sized,
{
    pub fn new(vcs: &'a V, service: &'a S, config: &'a OrgshipConfig, ctx: &'a JobContext) -> Self {
        Self {
            vcs,
            service,
            settings: None,
            config,
            ctx,
            cancel: CancellationToken::new(),
        }
    }

    /// Store for the last-deployed-revision marker.
    ///
    /// Only consulted when the configured settings backend is enabled.
    pub fn with_settings(mut self, settings: &'a dyn SettingsStore) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn settings(&self) -> Option<&'a dyn SettingsStore> {
        self.settings.filter(|_| self.config.settings.is_enabled())
    }

    pub async fn execute(&self) -> Result<RunReport> {
        let validate_only = self.config.deploy.validate_only;

        let marker = match self.settings() {
            Some(store) => {
                let marker = store.get().await?;
                info!(
                    "Last deployed revision: {}",
                    marker
                        .as_ref()
                        .and_then(|m| m.last_deployed_revision.as_deref())
                        .unwrap_or("none")
                );
                marker
            }
            None => None,
        };

        let prepared = prepare_run(self.vcs, self.config, self.ctx, marker.as_ref())?;
        let mut lines = prepared.summary_lines(self.config.deploy.test_level);

        let request = DeploymentRequest {
            archive: prepared.archive.bytes.clone(),
            validate_only,
            tests: prepared.tests.clone(),
            contains_code: prepared.contains_code,
        };
        info!(
            "Deploying archive {} for commit {}",
            prepared.archive.short_digest(),
            prepared.current_commit
        );

        let outcome = Orchestrator::new(self.service, self.config.deploy.poll_settings())
            .with_cancellation(self.cancel.clone())
            .deploy(&request)
            .await?
            .into_result()?;

        let success = outcome.is_success();
        let mut rollback = None;
        if success {
            if prepared.tests.level.runs_tests() {
                lines.extend(coverage_lines(&outcome.coverage, outcome.total_coverage));
            }
            if !validate_only {
                rollback = self.write_rollback(&prepared)?;
                self.record_revision(&prepared).await?;
            }
        } else {
            lines.extend(failure_lines(&outcome));
        }

        lines.push(verdict_line(success, validate_only));
        Ok(RunReport {
            success,
            validate_only,
            lines,
            outcome,
            rollback,
        })
    }

    fn write_rollback(&self, prepared: &PreparedRun) -> Result<Option<PathBuf>> {
        let Some(previous) = prepared.previous_commit.as_deref() else {
            info!("Deploy-all run, no rollback package");
            return Ok(None);
        };

        let archive = RollbackBuilder::new(self.vcs, previous, &self.config.org.api_version)
            .build(&prepared.changes)?;
        let path = rollback_path(
            &self.ctx.workspace,
            &self.config.deploy.rollback_dir,
            &self.ctx.job_name,
            &self.ctx.build_number,
        );
        write_archive(&archive, &path)?;
        Ok(Some(path))
    }

    async fn record_revision(&self, prepared: &PreparedRun) -> Result<()> {
        let Some(store) = self.settings() else {
            if self.config.settings.is_enabled() {
                warn!("Settings backend enabled but no store available, marker not updated");
            }
            return Ok(());
        };
        store
            .set(
                &prepared.current_commit,
                &self.ctx.job_name,
                &self.ctx.build_number,
            )
            .await?;
        info!("Last deployed revision set to {}", prepared.current_commit);
        Ok(())
    }
}
