//! Terminal result of a deployment.

use super::service::{
    ClassCoverage, ComponentFailure, CoverageWarning, DeployStatus, TestFailure, coverage_percent,
};
use crate::error::{Error, Result};

/// How the deployment ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    Succeeded,
    /// The org rejected the content (component or test failures)
    Failed,
    /// Polling budget exhausted; the deployment may still complete remotely
    TimedOut { async_id: String },
    /// The service reported an error code unrelated to content
    ServiceError { code: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentOutcome {
    pub async_id: String,
    pub state: DeployState,
    pub component_failures: Vec<ComponentFailure>,
    pub test_failures: Vec<TestFailure>,
    pub coverage: Vec<ClassCoverage>,
    pub coverage_warnings: Vec<CoverageWarning>,
    /// Aggregate coverage percentage over `coverage`
    pub total_coverage: f64,
    /// Number of status queries issued while polling
    pub status_checks: u32,
}

impl DeploymentOutcome {
    fn empty(async_id: &str, state: DeployState, status_checks: u32) -> Self {
        Self {
            async_id: async_id.to_string(),
            state,
            component_failures: Vec::new(),
            test_failures: Vec::new(),
            coverage: Vec::new(),
            coverage_warnings: Vec::new(),
            total_coverage: 0.0,
            status_checks,
        }
    }

    pub(crate) fn timed_out(async_id: &str, status_checks: u32) -> Self {
        Self::empty(
            async_id,
            DeployState::TimedOut {
                async_id: async_id.to_string(),
            },
            status_checks,
        )
    }

    pub(crate) fn service_error(
        async_id: &str,
        code: String,
        message: String,
        status_checks: u32,
    ) -> Self {
        Self::empty(
            async_id,
            DeployState::ServiceError { code, message },
            status_checks,
        )
    }

    /// Classify a finished status.
    pub fn finished(status: DeployStatus, status_checks: u32) -> Self {
        let state = if status.success {
            DeployState::Succeeded
        } else {
            DeployState::Failed
        };
        let mut outcome = Self::empty(&status.id, state, status_checks);

        if let Some(details) = status.details {
            outcome.total_coverage = aggregate_coverage(&details.code_coverage);
            outcome.component_failures = details.component_failures;
            outcome.test_failures = details.test_failures;
            outcome.coverage = details.code_coverage;
            outcome.coverage_warnings = details.coverage_warnings;
        }
        outcome
    }

    pub fn is_success(&self) -> bool {
        self.state == DeployState::Succeeded
    }

    /// Turn timeouts and service errors into errors; keep content results.
    pub fn into_result(self) -> Result<Self> {
        match self.state {
            DeployState::TimedOut { async_id } => Err(Error::Timeout {
                async_id,
                attempts: self.status_checks,
            }),
            DeployState::ServiceError { code, message } => Err(Error::Service { code, message }),
            DeployState::Succeeded | DeployState::Failed => Ok(self),
        }
    }
}

/// `(1 - uncovered / total) * 100` across all classes, 0 when nothing is measurable.
pub fn aggregate_coverage(classes: &[ClassCoverage]) -> f64 {
    let total: u64 = classes.iter().map(|c| c.total_lines as u64).sum();
    let uncovered: u64 = classes.iter().map(|c| c.uncovered_lines as u64).sum();
    coverage_percent(uncovered, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::service::DeployDetails;

    fn class(name: &str, total: u32, uncovered: u32) -> ClassCoverage {
        ClassCoverage {
            name: name.to_string(),
            namespace: None,
            total_lines: total,
            uncovered_lines: uncovered,
        }
    }

    #[test]
    fn zero_line_class_does_not_skew_aggregate() {
        let classes = [class("A", 100, 20), class("B", 0, 0)];
        assert!((aggregate_coverage(&classes) - 80.0).abs() < 1e-9);
        assert_eq!(classes[1].percent(), 0.0);
    }

    #[test]
    fn no_lines_is_zero_coverage() {
        assert_eq!(aggregate_coverage(&[]), 0.0);
    }

    #[test]
    fn finished_status_carries_details() {
        let status = DeployStatus {
            id: "0Af1".into(),
            done: true,
            success: false,
            details: Some(DeployDetails {
                component_failures: vec![ComponentFailure {
                    file_name: "classes/A.cls".into(),
                    full_name: "A".into(),
                    problem: "Unexpected token".into(),
                    line: Some(3),
                    column: Some(7),
                    ..Default::default()
                }],
                code_coverage: vec![class("A", 10, 5)],
                ..Default::default()
            }),
            ..Default::default()
        };
        let outcome = DeploymentOutcome::finished(status, 4);
        assert_eq!(outcome.state, DeployState::Failed);
        assert_eq!(outcome.component_failures.len(), 1);
        assert!((outcome.total_coverage - 50.0).abs() < 1e-9);
        assert_eq!(outcome.status_checks, 4);
    }

    #[test]
    fn timeout_becomes_error_with_handle() {
        let err = DeploymentOutcome::timed_out("0Af9", 5).into_result().unwrap_err();
        match err {
            Error::Timeout { async_id, attempts } => {
                assert_eq!(async_id, "0Af9");
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
