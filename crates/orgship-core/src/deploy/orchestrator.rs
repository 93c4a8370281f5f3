//! Submit, poll and classify a deployment.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::outcome::DeploymentOutcome;
use super::service::{DeployOptions, DeployService, DeployStatus};
use super::test_level::TestPlan;
use crate::error::{Error, Result};

/// Full details are requested on every n-th status check.
pub const DETAIL_EVERY: u32 = 3;

/// Poll cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(30_000),
            max_attempts: 200,
        }
    }
}

/// Everything needed to submit one deployment.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub archive: Vec<u8>,
    pub validate_only: bool,
    /// Effective test plan, already decided
    pub tests: TestPlan,
    pub contains_code: bool,
}

impl DeploymentRequest {
    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} bytes {}, test level {}",
            if self.validate_only {
                "validation"
            } else {
                "deployment"
            },
            self.archive.len(),
            if self.contains_code {
                "with code"
            } else {
                "without code"
            },
            self.tests.level
        )
    }

    fn options(&self) -> DeployOptions {
        DeployOptions {
            check_only: self.validate_only,
            test_level: self.tests.level,
            run_tests: self.tests.tests.clone(),
        }
    }
}

/// Drives a deployment through the remote service.
pub struct Orchestrator<'a, S: ?Sized> {
    service: &'a S,
    poll: PollSettings,
    cancel: CancellationToken,
}

impl<'a, S> Orchestrator<'a, S>
where
    S: DeployService + ?Sized,
{
    pub fn new(service: &'a S, poll: PollSettings) -> Self {
        Self {
            service,
            poll,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Submit the request and poll until it finishes, fails or runs out of attempts.
    ///
    /// Timeouts and service-level rejections are returned as outcome states;
    /// cancellation and transport failures are errors.
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentOutcome> {
        let options = request.options();
        info!("Submitting {}", request.summary());
        let async_id = self.service.submit(&request.archive, &options).await?;
        info!("Submitted, async id {}", async_id);

        self.poll_until_done(&async_id).await
    }

    /// Poll an already submitted deployment.
    pub async fn poll_until_done(&self, async_id: &str) -> Result<DeploymentOutcome> {
        let mut status_checks: u32 = 0;
        let mut attempt: u32 = 0;

        let (status, detailed) = loop {
            attempt += 1;

            if self.cancel.is_cancelled() {
                return Err(self.cancelled(async_id));
            }
            if attempt > self.poll.max_attempts {
                warn!(
                    "Deployment {} still running after {} status checks",
                    async_id, status_checks
                );
                return Ok(DeploymentOutcome::timed_out(async_id, status_checks));
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(async_id)),
                _ = tokio::time::sleep(self.poll.interval) => {}
            }

            let detailed = attempt % DETAIL_EVERY == 0;
            let status = self.service.check_status(async_id, detailed).await?;
            status_checks += 1;

            if let Some(outcome) = rejected(async_id, &status, status_checks) {
                return Ok(outcome);
            }
            log_progress(&status, attempt);

            if status.done {
                break (status, detailed);
            }
        };

        let status = if detailed {
            status
        } else {
            debug!("Fetching final details for {}", async_id);
            let status = self.service.check_status(async_id, true).await?;
            status_checks += 1;
            if let Some(outcome) = rejected(async_id, &status, status_checks) {
                return Ok(outcome);
            }
            status
        };

        Ok(DeploymentOutcome::finished(status, status_checks))
    }

    fn cancelled(&self, async_id: &str) -> Error {
        warn!("Polling cancelled for {}", async_id);
        Error::Cancelled {
            async_id: async_id.to_string(),
        }
    }
}

fn rejected(async_id: &str, status: &DeployStatus, status_checks: u32) -> Option<DeploymentOutcome> {
    let code = status.error_status_code.as_ref()?;
    let message = status.error_message.clone().unwrap_or_default();
    warn!("Service error {}: {}", code, message);
    Some(DeploymentOutcome::service_error(
        async_id,
        code.clone(),
        message,
        status_checks,
    ))
}

fn log_progress(status: &DeployStatus, attempt: u32) {
    let state = status.status.as_deref().unwrap_or("Unknown");
    if status.components_total > 0 || status.tests_total > 0 {
        info!(
            "[{}] {}: components {}/{}, tests {}/{}",
            attempt,
            state,
            status.components_deployed,
            status.components_total,
            status.tests_completed,
            status.tests_total
        );
    } else {
        info!("[{}] {}", attempt, state);
    }
}
