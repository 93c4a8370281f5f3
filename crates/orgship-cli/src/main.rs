//! Orgship - metadata deployments from version control
//!
//! Usage:
//!   orgship deploy              # Deploy the changes since the last deployment
//!   orgship deploy --validate   # Check-only deployment
//!   orgship plan                # Show what would be deployed
//!   orgship status <async-id>   # Inspect a deployment that timed out

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orgship_core::commands::{DeployCommand, PlanCommand, check_deployment};
use orgship_core::config::{OrgshipConfig, SettingsBackend, load_config};
use orgship_core::deploy::TestLevel;
use orgship_core::deploy::report::verdict_line;
use orgship_core::job::JobContext;
use orgship_core::remote::{OrgClient, RemoteSettingsStore};
use orgship_core::settings::{FileSettingsStore, SettingsStore};
use orgship_core::vcs::GitRepository;

#[derive(Parser)]
#[command(name = "orgship")]
#[command(about = "Deploy org metadata changes from git", long_about = None)]
struct Cli {
    /// Path to orgship.toml (defaults to the workspace, then the user config dir)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Repository checkout to deploy from (defaults to $WORKSPACE, then the current directory)
    #[arg(long, short, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the change-set to the org
    Deploy(DeployArgs),

    /// Resolve and package without contacting the org
    Plan(PlanArgs),

    /// Query a submitted deployment once
    Status {
        /// Async id reported by a previous run
        async_id: String,

        #[command(flatten)]
        login: LoginArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Overrides for baseline resolution and the deploy section of the config.
#[derive(Args)]
struct RunArgs {
    /// Test level (NoTestRun, RunSpecifiedTests, RunLocalTests, RunAllTestsInOrg)
    #[arg(long, value_parser = parse_test_level)]
    test_level: Option<TestLevel>,

    /// Validate only; nothing is committed to the org
    #[arg(long = "validate")]
    validate_only: bool,

    /// Deploy every entity under the source root
    #[arg(long, conflicts_with = "no_deploy_all")]
    deploy_all: bool,

    /// Never fall back to deploying everything
    #[arg(long)]
    no_deploy_all: bool,

    /// Diff against this commit
    #[arg(long, value_name = "REV")]
    previous_commit: Option<String>,

    /// Pull-request mode: diff against origin/<BRANCH>
    #[arg(long, value_name = "BRANCH")]
    pr_target: Option<String>,
}

/// Credentials; secrets are best passed through the environment.
#[derive(Args)]
struct LoginArgs {
    #[arg(long, env = "ORGSHIP_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ORGSHIP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "ORGSHIP_SECURITY_TOKEN", hide_env_values = true)]
    security_token: Option<String>,

    #[arg(long, env = "ORGSHIP_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "ORGSHIP_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

#[derive(Args)]
struct DeployArgs {
    #[command(flatten)]
    run: RunArgs,

    #[command(flatten)]
    login: LoginArgs,

    /// Output format
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Args)]
struct PlanArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Also write the archive that would be submitted
    #[arg(long, value_name = "PATH")]
    archive: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,
}

fn parse_test_level(value: &str) -> std::result::Result<TestLevel, String> {
    value.parse::<TestLevel>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orgship=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut validate_only = false;

    match run_cli(cli, &mut validate_only).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), err);
            println!("{}", style(verdict_line(false, validate_only)).red());
            ExitCode::FAILURE
        }
    }
}

/// Run one subcommand. `validate_only` is set once the effective deploy
/// settings are known so a failed run reports the right verdict.
async fn run_cli(cli: Cli, validate_only: &mut bool) -> Result<bool> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let mut ctx = JobContext::from_env(&cwd);
    if let Some(workspace) = cli.workspace {
        ctx.workspace = workspace;
    }
    let mut config = load_config(cli.config.as_deref(), &ctx.workspace)?;

    match cli.command {
        Commands::Deploy(args) => {
            apply_run_args(&args.run, &mut config, &mut ctx);
            *validate_only = config.deploy.validate_only;
            apply_login_args(&args.login, &mut config);
            run_deploy(&config, &ctx, args.format).await
        }
        Commands::Plan(args) => {
            apply_run_args(&args.run, &mut config, &mut ctx);
            run_plan(&config, &ctx, args.archive.as_deref(), args.format).await
        }
        Commands::Status {
            async_id,
            login,
            format,
        } => {
            apply_login_args(&login, &mut config);
            run_status(&config, &async_id, format).await
        }
    }
}

fn apply_run_args(args: &RunArgs, config: &mut OrgshipConfig, ctx: &mut JobContext) {
    if let Some(level) = args.test_level {
        config.deploy.test_level = level;
    }
    if args.validate_only {
        config.deploy.validate_only = true;
    }
    if args.deploy_all {
        ctx.deploy_all = Some(true);
    } else if args.no_deploy_all {
        ctx.deploy_all = Some(false);
    }
    if let Some(previous) = &args.previous_commit {
        ctx.previous_commit = Some(previous.clone());
    }
    if let Some(branch) = &args.pr_target {
        ctx.pr_target_branch = Some(branch.clone());
    }
}

fn apply_login_args(args: &LoginArgs, config: &mut OrgshipConfig) {
    let org = &mut config.org;
    for (value, slot) in [
        (&args.username, &mut org.username),
        (&args.password, &mut org.password),
        (&args.security_token, &mut org.security_token),
        (&args.client_id, &mut org.client_id),
        (&args.client_secret, &mut org.client_secret),
    ] {
        if value.is_some() {
            *slot = value.clone();
        }
    }
}

async fn login(config: &OrgshipConfig) -> Result<Arc<OrgClient>> {
    let credentials = config.credentials()?;
    let client = OrgClient::login(&credentials, &config.org.api_version).await?;
    Ok(Arc::new(client))
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            token.cancel();
        }
    });
    cancel
}

async fn run_deploy(config: &OrgshipConfig, ctx: &JobContext, format: OutputFormat) -> Result<bool> {
    let client = login(config).await?;
    let repo = GitRepository::open(&ctx.workspace)?;

    let settings: Option<Box<dyn SettingsStore>> = match config.settings.backend {
        SettingsBackend::None => None,
        SettingsBackend::File => Some(Box::new(FileSettingsStore::new(
            config.settings.file_path(&ctx.workspace),
        ))),
        SettingsBackend::Org => Some(Box::new(RemoteSettingsStore::new(client.clone()))),
    };

    let mut command = DeployCommand::new(&repo, client.as_ref(), config, ctx)
        .with_cancellation(cancel_on_ctrl_c());
    if let Some(store) = settings.as_deref() {
        command = command.with_settings(store);
    }
    let report = command.execute().await?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "success": report.success,
                "validate_only": report.validate_only,
                "async_id": report.outcome.async_id,
                "status_checks": report.outcome.status_checks,
                "total_coverage": report.outcome.total_coverage,
                "rollback": report.rollback,
                "report": report.lines,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            let (body, verdict) = report.lines.split_at(report.lines.len().saturating_sub(1));
            for line in body {
                println!("{}", line);
            }
            for line in verdict {
                if report.success {
                    println!("{}", style(line).green().bold());
                } else {
                    println!("{}", style(line).red().bold());
                }
            }
            if let Some(path) = &report.rollback {
                println!("Rollback package: {}", style(path.display()).cyan());
            }
        }
    }
    Ok(report.success)
}

async fn run_plan(
    config: &OrgshipConfig,
    ctx: &JobContext,
    archive: Option<&Path>,
    format: OutputFormat,
) -> Result<bool> {
    let repo = GitRepository::open(&ctx.workspace)?;

    let marker = match config.settings.backend {
        SettingsBackend::File => {
            FileSettingsStore::new(config.settings.file_path(&ctx.workspace))
                .get()
                .await?
        }
        SettingsBackend::Org => {
            warn!("plan does not read the org settings marker; pass --previous-commit to diff");
            None
        }
        SettingsBackend::None => None,
    };

    let report = PlanCommand::new(&repo, config, ctx)
        .with_marker(marker)
        .execute()?;
    if let Some(path) = archive {
        report
            .write_archive(path)
            .with_context(|| format!("Failed to write archive to {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => {
            let prepared = &report.prepared;
            let output = serde_json::json!({
                "current_commit": prepared.current_commit,
                "previous_commit": prepared.previous_commit,
                "deploy": prepared.archive.manifest.types(),
                "delete": prepared.archive.destructive.types(),
                "test_level": prepared.tests.level.as_str(),
                "tests": prepared.tests.tests,
                "digest": prepared.archive.digest,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!("{}", report.render()),
    }
    Ok(true)
}

async fn run_status(config: &OrgshipConfig, async_id: &str, format: OutputFormat) -> Result<bool> {
    let client = login(config).await?;
    let report = check_deployment(client.as_ref(), async_id).await?;
    let success = report.outcome.as_ref().is_some_and(|o| o.is_success());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "async_id": report.async_id,
                "done": report.done,
                "success": success,
                "report": report.lines,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!("{}", report.render()),
    }
    Ok(!report.done || success)
}
