//! Test levels and the pre-submission decision of which one to request.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Which tests the service runs during a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestLevel {
    #[default]
    #[serde(alias = "none")]
    NoTestRun,
    #[serde(alias = "specified")]
    RunSpecifiedTests,
    #[serde(alias = "local")]
    RunLocalTests,
    #[serde(alias = "all")]
    RunAllTestsInOrg,
}

impl TestLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestLevel::NoTestRun => "NoTestRun",
            TestLevel::RunSpecifiedTests => "RunSpecifiedTests",
            TestLevel::RunLocalTests => "RunLocalTests",
            TestLevel::RunAllTestsInOrg => "RunAllTestsInOrg",
        }
    }

    pub fn runs_tests(&self) -> bool {
        !matches!(self, TestLevel::NoTestRun)
    }
}

impl fmt::Display for TestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NoTestRun" | "none" => Ok(TestLevel::NoTestRun),
            "RunSpecifiedTests" | "specified" => Ok(TestLevel::RunSpecifiedTests),
            "RunLocalTests" | "local" => Ok(TestLevel::RunLocalTests),
            "RunAllTestsInOrg" | "all" => Ok(TestLevel::RunAllTestsInOrg),
            other => Err(Error::config(format!(
                "Unknown test level '{}'. Expected one of: NoTestRun, RunSpecifiedTests, \
                 RunLocalTests, RunAllTestsInOrg",
                other
            ))),
        }
    }
}

/// The test level actually requested, with its test list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    pub level: TestLevel,
    pub tests: Vec<String>,
}

/// Decide the effective test level.
///
/// A specified-tests request with an empty list downgrades to no tests; the
/// service rejects an empty list. Otherwise a change without code runs no
/// tests.
pub fn decide_test_level(
    requested: TestLevel,
    specified: &BTreeSet<String>,
    contains_code: bool,
) -> TestPlan {
    let plan = if requested == TestLevel::RunSpecifiedTests {
        if specified.is_empty() {
            if contains_code {
                warn!("No tests found for the deployed code, running no tests");
            }
            TestPlan {
                level: TestLevel::NoTestRun,
                tests: Vec::new(),
            }
        } else {
            TestPlan {
                level: TestLevel::RunSpecifiedTests,
                tests: specified.iter().cloned().collect(),
            }
        }
    } else if !contains_code {
        TestPlan {
            level: TestLevel::NoTestRun,
            tests: Vec::new(),
        }
    } else {
        TestPlan {
            level: requested,
            tests: Vec::new(),
        }
    };

    if plan.level != requested {
        info!("Test level {} requested, using {}", requested, plan.level);
    }
    plan
}
