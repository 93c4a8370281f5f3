//! Status command: inspect a deployment by async id.
//!
//! Used after a timeout, when the org may still have finished the job.

use tracing::info;

use crate::deploy::report::{REPORT_PREFIX, coverage_lines, failure_lines};
use crate::deploy::{DeployService, DeploymentOutcome};
use crate::error::{Error, Result};

/// Snapshot of a previously submitted deployment.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub async_id: String,
    pub done: bool,
    /// Present once the deployment is done
    pub outcome: Option<DeploymentOutcome>,
    pub lines: Vec<String>,
}

impl StatusReport {
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Query a deployment once, with details.
pub async fn check_deployment<S>(service: &S, async_id: &str) -> Result<StatusReport>
where
    S: DeployService + ?Sized,
{
    let status = service.check_status(async_id, true).await?;
    if let Some(code) = status.error_status_code.clone() {
        return Err(Error::service(code, status.error_message.unwrap_or_default()));
    }

    let state = status.status.clone().unwrap_or_else(|| "Unknown".to_string());
    info!("Deployment {} is {}", async_id, state);

    let mut lines = vec![format!("{} Deployment {}: {}", REPORT_PREFIX, async_id, state)];
    lines.push(format!(
        "Components: {}/{}, tests: {}/{}",
        status.components_deployed,
        status.components_total,
        status.tests_completed,
        status.tests_total
    ));

    if !status.done {
        return Ok(StatusReport {
            async_id: async_id.to_string(),
            done: false,
            outcome: None,
            lines,
        });
    }

    let outcome = DeploymentOutcome::finished(status, 1);
    if outcome.is_success() {
        lines.extend(coverage_lines(&outcome.coverage, outcome.total_coverage));
    } else {
        lines.extend(failure_lines(&outcome));
    }
    lines.push(format!(
        "{} Deployment {}",
        REPORT_PREFIX,
        if outcome.is_success() {
            "Succeeded"
        } else {
            "Failed"
        }
    ));

    Ok(StatusReport {
        async_id: async_id.to_string(),
        done: true,
        outcome: Some(outcome),
        lines,
    })
}
