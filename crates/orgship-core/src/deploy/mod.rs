//! Deployment orchestration.
//!
//! The [`Orchestrator`] submits an archive through a [`DeployService`],
//! polls it with a cancellable sleep between status checks and classifies
//! the terminal state into a [`DeploymentOutcome`]. The test level is
//! decided beforehand by [`decide_test_level`]; [`report`] renders the
//! outcome for humans.

mod orchestrator;
mod outcome;
pub mod report;
mod service;
mod test_level;

pub use orchestrator::{DETAIL_EVERY, DeploymentRequest, Orchestrator, PollSettings};
pub use outcome::{DeployState, DeploymentOutcome, aggregate_coverage};
pub use service::{
    ClassCoverage, ComponentFailure, CoverageWarning, DeployDetails, DeployOptions, DeployService,
    DeployStatus, TestFailure,
};
pub use test_level::{TestLevel, TestPlan, decide_test_level};
