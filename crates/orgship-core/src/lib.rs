//! Orgship Core Library
//!
//! Computes metadata change-sets from version control, packages them with
//! their manifests and drives deployments against a remote org, including
//! test selection, coverage reporting and rollback packages.

pub mod changeset;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod job;
pub mod manifest;
pub mod metadata;
pub mod package;
pub mod remote;
pub mod rollback;
pub mod settings;
pub mod testsel;
pub mod vcs;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{OrgshipConfig, SettingsBackend, load_config};

    // Change-sets and packaging
    pub use crate::changeset::ChangeSet;
    pub use crate::manifest::PackageManifest;
    pub use crate::metadata::{Classifier, MetadataEntity};
    pub use crate::package::{Archive, ArchiveBuilder};

    // Deployment
    pub use crate::deploy::{
        DeployService, DeployState, DeploymentOutcome, Orchestrator, PollSettings, TestLevel,
    };

    // Commands
    pub use crate::commands::{DeployCommand, PlanCommand, RunReport};
    pub use crate::job::{Baseline, JobContext};

    // Collaborators
    pub use crate::remote::{Credentials, OrgClient};
    pub use crate::settings::{FileSettingsStore, SettingsStore};
    pub use crate::vcs::{GitRepository, MemoryRepository, VersionControl};
}
