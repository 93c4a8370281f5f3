//! Plan command: resolve and package without contacting the org.

use std::path::Path;

use super::prepare::{PreparedRun, prepare_run};
use crate::config::OrgshipConfig;
use crate::deploy::report::REPORT_PREFIX;
use crate::error::Result;
use crate::job::JobContext;
use crate::settings::OrgSettings;
use crate::vcs::VersionControl;

/// What a deployment would send.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub prepared: PreparedRun,
    pub lines: Vec<String>,
}

/// Dry run of the deploy pipeline.
pub struct PlanCommand<'a, V: ?Sized> {
    vcs: &'a V,
    config: &'a OrgshipConfig,
    ctx: &'a JobContext,
    marker: Option<OrgSettings>,
}

impl<'a, V> PlanCommand<'a, V>
where
    V: VersionControl + ?Sized,
{
    pub fn new(vcs: &'a V, config: &'a OrgshipConfig, ctx: &'a JobContext) -> Self {
        Self {
            vcs,
            config,
            ctx,
            marker: None,
        }
    }

    /// Use a marker read beforehand (e.g. from the settings file).
    pub fn with_marker(mut self, marker: Option<OrgSettings>) -> Self {
        self.marker = marker;
        self
    }

    pub fn execute(&self) -> Result<PlanReport> {
        let prepared = prepare_run(self.vcs, self.config, self.ctx, self.marker.as_ref())?;

        let mut lines = vec![match prepared.previous_commit.as_deref() {
            Some(previous) => format!(
                "{} Changes {}..{}",
                REPORT_PREFIX, previous, prepared.current_commit
            ),
            None => format!(
                "{} All metadata at {}",
                REPORT_PREFIX, prepared.current_commit
            ),
        }];
        lines.extend(prepared.summary_lines(self.config.deploy.test_level));
        lines.push(format!(
            "{} Archive: {} bytes, blake3 {}",
            REPORT_PREFIX,
            prepared.archive.bytes.len(),
            prepared.archive.short_digest()
        ));

        Ok(PlanReport { prepared, lines })
    }
}

impl PlanReport {
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }

    /// Save the archive that would be submitted.
    pub fn write_archive(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.prepared.archive.bytes)?;
        Ok(())
    }
}
