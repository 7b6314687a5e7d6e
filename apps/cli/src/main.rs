//! keyturn - rotate database credentials for service-user fleets
//!
//! Reads the fleet description from a YAML file, collects run inputs from
//! the environment once at startup, and drives the rotation pipeline:
//! provision principals, publish connection strings into secrets, trigger
//! deployment restarts. Exits non-zero when any unit failed; the failure
//! summary is itemized so a re-run (idempotent by construction) can be
//! judged safely.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use keyturn_rotation::config::{ConfigFile, EnvironmentInput, RotationConfig};
use keyturn_rotation::{
    ArgoCdTrigger, AwsSecretsStore, AwsSecretsStoreConfig, CancellationToken, PhaseSelection,
    PipelineOptions, PostgresProvisioner, RotationPipeline,
};

#[derive(Parser)]
#[command(
    name = "keyturn",
    version,
    about = "Rotate database credentials for service-user fleets"
)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "keyturn.yaml", env = "KEYTURN_CONFIG")]
    config: PathBuf,

    /// Password derivation seed
    #[arg(long, env = "KEYTURN_SEED", hide_env_values = true)]
    seed: String,

    /// Rotation epoch; defaults to the current unix time. Re-running with
    /// the same value reproduces the same credentials.
    #[arg(long, env = "KEYTURN_TIMESTAMP")]
    timestamp: Option<String>,

    /// Admin password fallback when the config file omits it
    #[arg(long, env = "KEYTURN_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Bearer token for the deployment restart endpoint
    #[arg(long, env = "KEYTURN_ARGOCD_TOKEN", hide_env_values = true)]
    argocd_token: Option<String>,

    /// AWS endpoint override (for LocalStack-style testing)
    #[arg(long, env = "KEYTURN_SECRETS_ENDPOINT")]
    secrets_endpoint: Option<String>,

    /// Stop issuing new work after the first failure
    #[arg(long)]
    fail_fast: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run all phases: create db access, update secrets, restart
    /// deployments (the default)
    UpdateAll,
    /// Create database access for service users only
    CreateDbAccess,
    /// Update secrets with new credentials only
    UpdateSecrets,
    /// Restart service deployments only
    RestartDeployments,
}

impl Command {
    fn phases(self) -> PhaseSelection {
        match self {
            Self::UpdateAll => PhaseSelection::ALL,
            Self::CreateDbAccess => PhaseSelection::PROVISION,
            Self::UpdateSecrets => PhaseSelection::SECRETS,
            Self::RestartDeployments => PhaseSelection::RESTART,
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!(error = format!("{error:#}"), "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let timestamp = cli
        .timestamp
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().timestamp().to_string());

    let environment = EnvironmentInput {
        seed: cli.seed.clone(),
        timestamp,
        admin_password: cli.admin_password.clone(),
        argocd_token: cli.argocd_token.clone(),
    };

    tracing::info!(
        config = %cli.config.display(),
        timestamp = %environment.timestamp,
        "Booting rotation run"
    );

    let file = ConfigFile::load(&cli.config).context("loading configuration")?;
    let config = RotationConfig::resolve(file, &environment).context("resolving configuration")?;
    tracing::info!(
        client = %config.client,
        users = config.service_users.len(),
        "Loaded configuration"
    );

    let phases = cli.command.unwrap_or(Command::UpdateAll).phases();

    let mut builder = RotationPipeline::builder().options(PipelineOptions {
        fail_fast: cli.fail_fast,
    });

    if phases.provision {
        let provisioner = PostgresProvisioner::connect(&config.run.cluster)
            .await
            .context("connecting to admin cluster")?;
        builder = builder.provisioner(Arc::new(provisioner));
    }

    if phases.sync_secrets {
        let store = AwsSecretsStore::new(AwsSecretsStoreConfig {
            region: None,
            endpoint_url: cli.secrets_endpoint.clone(),
        })
        .await;
        builder = builder.secret_store(Arc::new(store));
    }

    if phases.restart {
        if let Some(token) = &config.run.argocd_token {
            builder = builder.restart_trigger(Arc::new(ArgoCdTrigger::new(token)));
        }
    }

    let pipeline = builder.build();

    // Ctrl-C stops issuing new units; in-flight work reaches a
    // deterministic commit or rollback.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight work only");
            signal_cancel.cancel();
        }
    });

    let report = pipeline
        .run_phases(&config.run, &config.service_users, &cancel, phases)
        .await?;

    for failure in &report.failures {
        tracing::error!(error = %failure, "Itemized failure");
    }
    for skipped in &report.skipped {
        tracing::warn!(unit = %skipped, "Skipped");
    }
    tracing::info!(summary = %report, "Done");

    Ok(report.is_success())
}
