//! High-level commands for orgship operations.
//!
//! These wire the components into complete runs and are what the CLI calls.

pub mod deploy;
pub mod plan;
mod prepare;
pub mod status;

pub use deploy::{DeployCommand, RunReport};
pub use plan::{PlanCommand, PlanReport};
pub use prepare::{PreparedRun, prepare_run};
pub use status::{StatusReport, check_deployment};
