//! Keyturn rotation pipeline
//!
//! Rotates database credentials for a fleet of logical service users:
//! derives one password per user per run, ensures the matching Postgres
//! role under a serializable transaction, publishes connection strings
//! into secret-store documents, and triggers dependent deployments to
//! reload them.
//!
//! # Design
//!
//! - **Deterministic credentials** - the same run timestamp reproduces the
//!   same usernames and passwords, so the whole pipeline is safe to re-run.
//! - **Seams, not wiring** - the database, the secret store, and the
//!   restart endpoint sit behind [`Provisioner`], [`SecretStore`], and
//!   [`RestartTrigger`]; production implementations and in-process test
//!   doubles are interchangeable.
//! - **No cross-store transaction** - a secret-sync failure never rolls
//!   back committed database work; recovery is re-running the pipeline.

#![deny(unsafe_code)]
#![forbid(unsafe_code)]

/// Configuration file schema and loading
pub mod config;
/// Core types, run context, and errors
pub mod core;
/// Rotation orchestrator and run report
pub mod pipeline;
/// Database principal provisioning
pub mod postgres;
/// Deployment restart triggering
pub mod restart;
/// Secret-store synchronization
pub mod secrets;
/// Test doubles for the external seams (always available)
pub mod testing;
/// Password derivation and credential validation
pub mod utils;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::core::{
    ClusterConfig, DatabaseGrant, Deployment, Principal, ProvisionError, RestartError,
    RotationError, RotationRun, SecretError, SecretTarget, ServiceUser, ValidationError,
};
pub use crate::pipeline::{
    PhaseSelection, PipelineOptions, RotationPipeline, RotationPipelineBuilder, RotationReport,
};
pub use crate::postgres::{PostgresProvisioner, Provisioner};
pub use crate::restart::{ArgoCdTrigger, RestartTrigger};
pub use crate::secrets::{
    AwsSecretsStore, AwsSecretsStoreConfig, MemorySecretStore, SecretDocument, SecretStore,
};

// Cancellation is part of the public `run` signature; re-exported so
// callers and tests need no direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

/// Commonly used types and traits
pub mod prelude {
    pub use crate::config::{ConfigError, RotationConfig};
    pub use crate::core::{
        DatabaseGrant, Deployment, Principal, RotationError, RotationRun, SecretTarget,
        ServiceUser,
    };
    pub use crate::pipeline::{PhaseSelection, PipelineOptions, RotationPipeline, RotationReport};
    pub use crate::postgres::Provisioner;
    pub use crate::restart::RestartTrigger;
    pub use crate::secrets::{SecretDocument, SecretStore};
    pub use crate::utils::{derive_password, validate_principal};
}
