//! Human-readable report lines for a deployment outcome.

use super::outcome::DeploymentOutcome;
use super::service::{ClassCoverage, ComponentFailure, CoverageWarning, TestFailure};

/// Prefix for report section headers.
pub const REPORT_PREFIX: &str = "[orgship]";

/// Format a percentage with at most two decimals and no trailing zeros.
pub fn format_percent(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn qualified(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

/// Component failures with their location.
pub fn component_failure_lines(failures: &[ComponentFailure]) -> Vec<String> {
    if failures.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} Component Failures", REPORT_PREFIX)];
    for failure in failures {
        let location = match failure.line {
            Some(line) if line > 0 => format!("({},{})", line, failure.column.unwrap_or(0)),
            _ if failure.file_name != failure.full_name => format!("({})", failure.full_name),
            _ => String::new(),
        };
        lines.push(format!("{}{}:{}", failure.file_name, location, failure.problem));
    }
    lines
}

pub fn test_failure_lines(failures: &[TestFailure]) -> Vec<String> {
    if failures.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} Test Failures", REPORT_PREFIX)];
    for failure in failures {
        let mut line = format!(
            "Test failure, method: {}.{} -- {}",
            qualified(failure.namespace.as_deref(), &failure.name),
            failure.method_name,
            failure.message
        );
        if let Some(stack) = failure.stack_trace.as_deref().filter(|s| !s.is_empty()) {
            line.push_str(" stack ");
            line.push_str(stack);
        }
        lines.push(line);
    }
    lines
}

pub fn coverage_warning_lines(warnings: &[CoverageWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} Code Coverage Warnings", REPORT_PREFIX)];
    for warning in warnings {
        let mut line = "Code coverage issue".to_string();
        if let Some(name) = warning.name.as_deref() {
            line.push_str(", class: ");
            line.push_str(&qualified(warning.namespace.as_deref(), name));
        }
        line.push_str(" -- ");
        line.push_str(&warning.message);
        lines.push(line);
    }
    lines
}

/// Per-class coverage followed by the aggregate.
pub fn coverage_lines(classes: &[ClassCoverage], total: f64) -> Vec<String> {
    if classes.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} Code Coverage Results", REPORT_PREFIX)];
    lines.extend(
        classes
            .iter()
            .map(|c| format!("{}.cls -- {}%", c.name, format_percent(c.percent()))),
    );
    lines.push(String::new());
    lines.push(format!(
        "Total code coverage for this deployment -- {}%",
        format_percent(total)
    ));
    lines
}

/// Everything that explains a failed deployment.
pub fn failure_lines(outcome: &DeploymentOutcome) -> Vec<String> {
    let mut lines = component_failure_lines(&outcome.component_failures);
    lines.extend(test_failure_lines(&outcome.test_failures));
    lines.extend(coverage_warning_lines(&outcome.coverage_warnings));
    lines
}

/// Final verdict line of a run.
pub fn verdict_line(success: bool, validate_only: bool) -> String {
    format!(
        "{} {} {}",
        REPORT_PREFIX,
        if validate_only { "Validation" } else { "Deployment" },
        if success { "Succeeded" } else { "Failed" }
    )
}
