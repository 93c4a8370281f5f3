//! Remote deployment service seam and its status model.

use async_trait::async_trait;

use super::TestLevel;
use crate::error::Result;

/// Options sent with a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Validate only; nothing is committed to the org
    pub check_only: bool,
    pub test_level: TestLevel,
    /// Tests to run when `test_level` is `RunSpecifiedTests`
    pub run_tests: Vec<String>,
}

/// One polled snapshot of a deployment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployStatus {
    pub id: String,
    pub done: bool,
    pub success: bool,
    /// Service-side state name (`Pending`, `InProgress`, `Succeeded`, ...)
    pub status: Option<String>,
    /// Set when the service rejected the request independently of its content
    pub error_status_code: Option<String>,
    pub error_message: Option<String>,
    pub components_deployed: u32,
    pub components_total: u32,
    pub tests_completed: u32,
    pub tests_total: u32,
    /// Present only when details were requested
    pub details: Option<DeployDetails>,
}

/// Component, test and coverage results of a deployment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployDetails {
    pub component_failures: Vec<ComponentFailure>,
    pub test_failures: Vec<TestFailure>,
    pub code_coverage: Vec<ClassCoverage>,
    pub coverage_warnings: Vec<CoverageWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFailure {
    pub file_name: String,
    pub full_name: String,
    pub component_type: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub problem: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFailure {
    pub name: String,
    pub namespace: Option<String>,
    pub method_name: String,
    pub message: String,
    pub stack_trace: Option<String>,
}

/// Line coverage for one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCoverage {
    pub name: String,
    pub namespace: Option<String>,
    pub total_lines: u32,
    pub uncovered_lines: u32,
}

impl ClassCoverage {
    /// Covered share in percent; 0 for a class without lines.
    pub fn percent(&self) -> f64 {
        coverage_percent(self.uncovered_lines as u64, self.total_lines as u64)
    }
}

/// Coverage issue not tied to line counts (e.g. unparsable class).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageWarning {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub message: String,
}

pub(crate) fn coverage_percent(uncovered: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (1.0 - uncovered as f64 / total as f64) * 100.0
}

/// Submit and poll deployments against an org.
#[async_trait]
pub trait DeployService: Send + Sync {
    /// Hand the archive to the service and return its async id.
    async fn submit(&self, archive: &[u8], options: &DeployOptions) -> Result<String>;

    /// Query a deployment's status, optionally with full details.
    async fn check_status(&self, async_id: &str, include_details: bool) -> Result<DeployStatus>;
}
