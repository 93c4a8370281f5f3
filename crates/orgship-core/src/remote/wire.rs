//! JSON shapes of the org's REST endpoints.

use serde::{Deserialize, Serialize};

use crate::deploy::{
    ClassCoverage, ComponentFailure, CoverageWarning, DeployDetails, DeployOptions, DeployStatus,
    TestFailure,
};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Element of the error array returned by data API failures.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiError {
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequestBody {
    pub deploy_options: WireDeployOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireDeployOptions {
    pub check_only: bool,
    pub rollback_on_error: bool,
    pub single_package: bool,
    pub test_level: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_tests: Vec<String>,
}

impl From<&DeployOptions> for DeployRequestBody {
    fn from(options: &DeployOptions) -> Self {
        Self {
            deploy_options: WireDeployOptions {
                check_only: options.check_only,
                rollback_on_error: true,
                single_package: true,
                test_level: options.test_level.as_str().to_string(),
                run_tests: options.run_tests.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequestResponse {
    pub id: String,
    #[serde(default)]
    pub deploy_result: Option<WireDeployResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireDeployResult {
    pub id: Option<String>,
    pub done: bool,
    pub success: bool,
    pub status: Option<String>,
    pub error_status_code: Option<String>,
    pub error_message: Option<String>,
    pub number_components_deployed: Option<u32>,
    pub number_components_total: Option<u32>,
    pub number_tests_completed: Option<u32>,
    pub number_tests_total: Option<u32>,
    pub details: Option<WireDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireDetails {
    pub component_failures: Vec<WireComponentMessage>,
    pub run_test_result: Option<WireRunTestResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireComponentMessage {
    pub file_name: Option<String>,
    pub full_name: Option<String>,
    pub component_type: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub problem: Option<String>,
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireRunTestResult {
    pub failures: Vec<WireTestFailure>,
    pub code_coverage: Vec<WireCodeCoverage>,
    pub code_coverage_warnings: Vec<WireCoverageWarning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireTestFailure {
    pub name: String,
    pub namespace: Option<String>,
    pub method_name: String,
    pub message: String,
    pub stack_trace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireCodeCoverage {
    pub name: String,
    pub namespace: Option<String>,
    pub num_locations: u32,
    pub num_locations_not_covered: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WireCoverageWarning {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub message: String,
}

impl WireDeployResult {
    pub fn into_status(self, async_id: &str) -> DeployStatus {
        DeployStatus {
            id: self.id.unwrap_or_else(|| async_id.to_string()),
            done: self.done,
            success: self.success,
            status: self.status,
            error_status_code: self.error_status_code,
            error_message: self.error_message,
            components_deployed: self.number_components_deployed.unwrap_or(0),
            components_total: self.number_components_total.unwrap_or(0),
            tests_completed: self.number_tests_completed.unwrap_or(0),
            tests_total: self.number_tests_total.unwrap_or(0),
            details: self.details.map(DeployDetails::from),
        }
    }
}

impl From<WireDetails> for DeployDetails {
    fn from(details: WireDetails) -> Self {
        let tests = details.run_test_result.unwrap_or_default();
        Self {
            component_failures: details
                .component_failures
                .into_iter()
                .filter(|m| !m.success)
                .map(|m| ComponentFailure {
                    file_name: m.file_name.unwrap_or_default(),
                    full_name: m.full_name.unwrap_or_default(),
                    component_type: m.component_type,
                    line: m.line_number,
                    column: m.column_number,
                    problem: m.problem.unwrap_or_default(),
                })
                .collect(),
            test_failures: tests
                .failures
                .into_iter()
                .map(|f| TestFailure {
                    name: f.name,
                    namespace: f.namespace,
                    method_name: f.method_name,
                    message: f.message,
                    stack_trace: f.stack_trace,
                })
                .collect(),
            code_coverage: tests
                .code_coverage
                .into_iter()
                .map(|c| ClassCoverage {
                    name: c.name,
                    namespace: c.namespace,
                    total_lines: c.num_locations,
                    uncovered_lines: c.num_locations_not_covered,
                })
                .collect(),
            coverage_warnings: tests
                .code_coverage_warnings
                .into_iter()
                .map(|w| CoverageWarning {
                    name: w.name,
                    namespace: w.namespace,
                    message: w.message,
                })
                .collect(),
        }
    }
}
