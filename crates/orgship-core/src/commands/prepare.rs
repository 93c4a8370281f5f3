//! Everything a run computes before talking to the org.
//!
//! Shared by `deploy` and `plan`: the change-set, the entity lists, both
//! manifests, the archive and the effective test plan are computed once here
//! and only read afterwards.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::changeset::{ChangeSet, resolve_commits, resolve_full};
use crate::config::OrgshipConfig;
use crate::deploy::report::REPORT_PREFIX;
use crate::deploy::{TestLevel, TestPlan, decide_test_level};
use crate::error::Result;
use crate::job::{Baseline, JobContext, resolve_baseline};
use crate::manifest::{PackageManifest, contains_code};
use crate::metadata::{Classifier, MetadataEntity, code_members};
use crate::package::{Archive, ArchiveBuilder};
use crate::settings::OrgSettings;
use crate::testsel::{ClassTestMapping, TestSelector};
use crate::vcs::VersionControl;

/// The resolved, packaged content of one run.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub baseline: Baseline,
    /// Commit id being deployed
    pub current_commit: String,
    /// Commit id diffed against; `None` for deploy-all runs
    pub previous_commit: Option<String>,
    pub changes: ChangeSet,
    pub deploy_entities: Vec<MetadataEntity>,
    pub delete_entities: Vec<MetadataEntity>,
    pub archive: Archive,
    pub contains_code: bool,
    /// Tests selected for the code being deployed
    pub specified_tests: BTreeSet<String>,
    /// Effective test level and list sent with the deployment
    pub tests: TestPlan,
}

impl PreparedRun {
    /// Report lines listing what is deployed, deleted and tested.
    pub fn summary_lines(&self, requested: TestLevel) -> Vec<String> {
        let mut lines = vec![format!("{} Deploying the following metadata:", REPORT_PREFIX)];
        lines.extend(self.archive.manifest.describe().into_iter().map(|l| format!("- {}", l)));

        if !self.archive.destructive.is_empty() {
            lines.push(format!("{} Deleting the following metadata:", REPORT_PREFIX));
            lines.extend(
                self.archive
                    .destructive
                    .describe()
                    .into_iter()
                    .map(|l| format!("- {}", l)),
            );
        }

        if requested == TestLevel::RunSpecifiedTests {
            lines.push(format!("{} Specified tests to run:", REPORT_PREFIX));
            lines.extend(self.specified_tests.iter().map(|t| format!("- {}", t)));
        }
        lines.push(format!("{} Test level: {}", REPORT_PREFIX, self.tests.level));
        lines
    }
}

/// Resolve the baseline, the change-set and the archive for a run.
pub fn prepare_run<V>(
    vcs: &V,
    config: &OrgshipConfig,
    ctx: &JobContext,
    marker: Option<&OrgSettings>,
) -> Result<PreparedRun>
where
    V: VersionControl + ?Sized,
{
    // Fail on a bad regex before touching the repository.
    let selector = TestSelector::new(&config.tests.regex)?;

    let baseline = resolve_baseline(ctx, config.settings.is_enabled(), marker)?;
    let current_commit = vcs.resolve(ctx.current_revision())?;
    let classifier = Classifier::new(config.deploy.source_root.as_str());

    let (changes, previous_commit) = match &baseline {
        Baseline::DeployAll => (resolve_full(vcs, &current_commit, &classifier)?, None),
        Baseline::Diff { previous } => {
            let previous = vcs.resolve(previous)?;
            (
                resolve_commits(vcs, &previous, &current_commit, &classifier)?,
                Some(previous),
            )
        }
    };

    let deploy_entities = changes.deploy_entities();
    let delete_entities = changes.delete_entities();
    let manifest = PackageManifest::build(&deploy_entities, false);
    let destructive = PackageManifest::build(&delete_entities, true);
    let has_code = contains_code(&deploy_entities);

    let archive = ArchiveBuilder::new(vcs, &current_commit, &config.org.api_version).build(
        &deploy_entities,
        manifest,
        destructive,
    )?;

    let requested = config.deploy.test_level;
    let specified_tests = if requested == TestLevel::RunSpecifiedTests {
        let mapping = config
            .tests
            .manifest
            .as_ref()
            .and_then(|path| ClassTestMapping::load(&ctx.workspace.join(path)));
        let inventory = code_inventory(vcs, &current_commit, &classifier)?;
        debug!("Code inventory has {} entities", inventory.len());
        selector
            .with_mapping(mapping)
            .select(&code_members(&deploy_entities), &inventory)?
    } else {
        BTreeSet::new()
    };

    let tests = decide_test_level(requested, &specified_tests, has_code);
    info!(
        "Prepared {} entities to deploy, {} to delete, test level {}",
        deploy_entities.len(),
        delete_entities.len(),
        tests.level
    );

    Ok(PreparedRun {
        baseline,
        current_commit,
        previous_commit,
        changes,
        deploy_entities,
        delete_entities,
        archive,
        contains_code: has_code,
        specified_tests,
        tests,
    })
}

/// Names of every code entity under the source root at `commit`.
fn code_inventory<V>(vcs: &V, commit: &str, classifier: &Classifier) -> Result<BTreeSet<String>>
where
    V: VersionControl + ?Sized,
{
    Ok(vcs
        .list(commit)?
        .iter()
        .filter_map(|path| classifier.classify(path))
        .filter(MetadataEntity::is_code)
        .map(|entity| entity.member)
        .collect())
}
