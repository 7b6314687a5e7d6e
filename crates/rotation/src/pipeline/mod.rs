//! Rotation orchestrator
//!
//! Composes derivation, validation, provisioning, secret sync, and restart
//! triggering across the fleet, in the fixed order the correctness story
//! depends on: a running service must never be pointed at a credential
//! that was not provisioned. Within each phase, service users are
//! processed sequentially in configuration order, so log output and
//! failure attribution map predictably onto the config file.

mod report;

pub use report::RotationReport;

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{RotationError, RotationRun, ServiceUser};
use crate::postgres::Provisioner;
use crate::restart::RestartTrigger;
use crate::secrets::{SecretStore, build_database_url, sync_secret};
use crate::utils::validate_principal;

/// Orchestrator strictness knobs
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Stop issuing new work after the first failure. The default collects
    /// every failure and reports them all.
    pub fail_fast: bool,
}

/// Which phases one invocation executes
///
/// Validation always runs; it has no side effects and the policy is never
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSelection {
    /// Provision database principals
    pub provision: bool,
    /// Synchronize secret targets
    pub sync_secrets: bool,
    /// Trigger deployment restarts
    pub restart: bool,
}

impl PhaseSelection {
    /// Every phase, in order
    pub const ALL: Self = Self {
        provision: true,
        sync_secrets: true,
        restart: true,
    };
    /// Database provisioning only
    pub const PROVISION: Self = Self {
        provision: true,
        sync_secrets: false,
        restart: false,
    };
    /// Secret synchronization only
    pub const SECRETS: Self = Self {
        provision: false,
        sync_secrets: true,
        restart: false,
    };
    /// Restart triggering only
    pub const RESTART: Self = Self {
        provision: false,
        sync_secrets: false,
        restart: true,
    };
}

/// Builder for [`RotationPipeline`]
///
/// Seams are attached per invocation: a secrets-only run never opens a
/// database connection. A selected phase whose seam was not attached
/// records its units as skipped rather than failing.
#[derive(Default)]
pub struct RotationPipelineBuilder {
    provisioner: Option<Arc<dyn Provisioner>>,
    secret_store: Option<Arc<dyn SecretStore>>,
    restart_trigger: Option<Arc<dyn RestartTrigger>>,
    options: PipelineOptions,
}

impl RotationPipelineBuilder {
    /// Attach the database provisioner
    #[must_use]
    pub fn provisioner(mut self, provisioner: Arc<dyn Provisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// Attach the secret store
    #[must_use]
    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    /// Attach the restart trigger
    #[must_use]
    pub fn restart_trigger(mut self, trigger: Arc<dyn RestartTrigger>) -> Self {
        self.restart_trigger = Some(trigger);
        self
    }

    /// Set strictness options
    #[must_use]
    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Finish the build
    #[must_use]
    pub fn build(self) -> RotationPipeline {
        RotationPipeline {
            provisioner: self.provisioner,
            secret_store: self.secret_store,
            restart_trigger: self.restart_trigger,
            options: self.options,
        }
    }
}

/// The rotation pipeline over its three external seams
pub struct RotationPipeline {
    provisioner: Option<Arc<dyn Provisioner>>,
    secret_store: Option<Arc<dyn SecretStore>>,
    restart_trigger: Option<Arc<dyn RestartTrigger>>,
    options: PipelineOptions,
}

impl RotationPipeline {
    /// Start assembling a pipeline
    #[must_use]
    pub fn builder() -> RotationPipelineBuilder {
        RotationPipelineBuilder::default()
    }

    /// Run every phase over the fleet
    pub async fn run(
        &self,
        run: &RotationRun,
        users: &[ServiceUser],
        cancel: &CancellationToken,
    ) -> Result<RotationReport, RotationError> {
        self.run_phases(run, users, cancel, PhaseSelection::ALL)
            .await
    }

    /// Run the selected phases over the fleet.
    ///
    /// Every credential is validated before any side effect; a single
    /// violation aborts the whole run with `Err`. Phase failures do not
    /// abort: they are recorded in the report with their unit's identity,
    /// and that unit's dependent work in later phases is skipped.
    ///
    /// Cancellation is honored between units of work only - an in-flight
    /// database transaction always reaches its commit or rollback.
    pub async fn run_phases(
        &self,
        run: &RotationRun,
        users: &[ServiceUser],
        cancel: &CancellationToken,
        phases: PhaseSelection,
    ) -> Result<RotationReport, RotationError> {
        validate_all(users)?;
        tracing::info!(
            users = users.len(),
            timestamp = %run.timestamp,
            "Credentials derived and validated"
        );

        let mut report = RotationReport::default();
        // Usernames whose pipeline is broken: provisioning or secret sync
        // failed, so later phases must not act for them.
        let mut failed: HashSet<String> = HashSet::new();

        if phases.provision {
            self.provision_phase(users, cancel, &mut report, &mut failed)
                .await;
        }
        if phases.sync_secrets {
            self.sync_phase(run, users, cancel, &mut report, &mut failed)
                .await;
        }
        if phases.restart {
            self.restart_phase(users, cancel, &mut report, &failed).await;
        }

        tracing::info!(summary = %report, "Rotation run finished");
        Ok(report)
    }

    fn halted(&self, report: &RotationReport) -> bool {
        self.options.fail_fast && !report.failures.is_empty()
    }

    async fn provision_phase(
        &self,
        users: &[ServiceUser],
        cancel: &CancellationToken,
        report: &mut RotationReport,
        failed: &mut HashSet<String>,
    ) {
        let Some(provisioner) = &self.provisioner else {
            skip_all(
                report,
                users.iter().map(|u| format!("provision {} (no provisioner configured)", u.username)),
                "provisioner",
            );
            return;
        };

        for user in users {
            if cancel.is_cancelled() || self.halted(report) {
                report.skipped.push(format!("provision {}", user.username));
                continue;
            }

            tracing::info!(username = %user.username, "Provisioning principal");
            match provisioner
                .provision(&user.principal(), &user.databases)
                .await
            {
                Ok(()) => report.provisioned.push(user.username.clone()),
                Err(source) => {
                    failed.insert(user.username.clone());
                    let error = RotationError::Provision {
                        username: user.username.clone(),
                        source,
                    };
                    tracing::error!(error = %error, "Provisioning failed");
                    report.failures.push(error);
                }
            }
        }
    }

    async fn sync_phase(
        &self,
        run: &RotationRun,
        users: &[ServiceUser],
        cancel: &CancellationToken,
        report: &mut RotationReport,
        failed: &mut HashSet<String>,
    ) {
        let Some(store) = &self.secret_store else {
            skip_all(
                report,
                users
                    .iter()
                    .flat_map(|u| &u.secrets)
                    .map(|t| format!("sync {}[{}] (no secret store configured)", t.container, t.key)),
                "secret store",
            );
            return;
        };

        for user in users {
            let principal = user.principal();
            for target in &user.secrets {
                let label = format!("{}[{}]", target.container, target.key);

                if failed.contains(&user.username) || cancel.is_cancelled() || self.halted(report)
                {
                    report.skipped.push(format!("sync {label}"));
                    continue;
                }

                tracing::info!(username = %user.username, target = %label, "Updating secret");
                let value = build_database_url(&run.cluster, &principal, &target.database_name);
                match sync_secret(store.as_ref(), &target.container, &target.key, &value).await {
                    Ok(()) => report.synced.push(label),
                    Err(source) => {
                        failed.insert(user.username.clone());
                        let error = RotationError::Secret {
                            container: target.container.clone(),
                            key: target.key.clone(),
                            source,
                        };
                        tracing::error!(error = %error, "Secret sync failed");
                        report.failures.push(error);
                    }
                }
            }
        }
    }

    async fn restart_phase(
        &self,
        users: &[ServiceUser],
        cancel: &CancellationToken,
        report: &mut RotationReport,
        failed: &HashSet<String>,
    ) {
        let Some(trigger) = &self.restart_trigger else {
            skip_all(
                report,
                users
                    .iter()
                    .flat_map(|u| &u.deployments)
                    .map(|d| format!("restart {} (no trigger configured)", d.resource_name)),
                "restart trigger",
            );
            return;
        };

        for user in users {
            for deployment in &user.deployments {
                if failed.contains(&user.username) || cancel.is_cancelled() || self.halted(report)
                {
                    report
                        .skipped
                        .push(format!("restart {}", deployment.resource_name));
                    continue;
                }

                tracing::info!(resource = %deployment.resource_name, "Triggering restart");
                match trigger.restart(deployment).await {
                    Ok(()) => report.restarted.push(deployment.resource_name.clone()),
                    Err(source) => {
                        let error = RotationError::Restart {
                            resource_name: deployment.resource_name.clone(),
                            source,
                        };
                        tracing::error!(error = %error, "Restart failed");
                        report.failures.push(error);
                    }
                }
            }
        }
    }
}

fn skip_all(
    report: &mut RotationReport,
    labels: impl Iterator<Item = String>,
    seam: &str,
) {
    let skipped: Vec<_> = labels.collect();
    if !skipped.is_empty() {
        tracing::warn!(units = skipped.len(), "No {seam} configured; skipping phase");
        report.skipped.extend(skipped);
    }
}

/// Validate every principal in the fleet before anything touches an
/// external system.
fn validate_all(users: &[ServiceUser]) -> Result<(), RotationError> {
    for user in users {
        validate_principal(&user.principal())?;
    }
    Ok(())
}
