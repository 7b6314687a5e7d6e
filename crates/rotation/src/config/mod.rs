//! Configuration file schema and resolution
//!
//! The YAML file describes the fleet; the environment supplies the run
//! inputs (seed, timestamp, tokens). Both are collected once at process
//! start and resolved into a [`RotationRun`] plus fully-derived
//! [`ServiceUser`] values, so core logic never reads ambient state.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::{
    ClusterConfig, DatabaseGrant, Deployment, RotationRun, SecretTarget, ServiceUser,
};
use crate::utils::derive_password;

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path as given
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the expected schema
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Path as given
        path: String,
        /// Underlying parser error
        #[source]
        source: serde_yaml::Error,
    },

    /// A required value is absent from both file and environment
    #[error("missing required value: {field}")]
    MissingValue {
        /// Which value, including where it may be supplied
        field: String,
    },
}

// ── File schema ─────────────────────────────────────────────────────────────

/// Raw configuration file contents
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    /// Client identifier, used only for log attribution
    pub client: String,
    /// Target cluster
    pub cluster: ClusterSchema,
    /// The fleet
    #[serde(default)]
    pub service_users: Vec<ServiceUserSchema>,
}

/// Cluster section
#[derive(Debug, Deserialize)]
pub struct ClusterSchema {
    /// Cluster hostname
    pub host: String,
    /// Cluster port
    pub port: u16,
    /// Administrator role
    pub admin_user: String,
    /// Administrator password; may instead come from the environment
    #[serde(default)]
    pub admin_password: Option<String>,
}

/// One service-user entry
#[derive(Debug, Deserialize)]
pub struct ServiceUserSchema {
    /// Role-name prefix; the run timestamp is appended
    pub username_prefix: String,
    /// Databases to grant against
    #[serde(default)]
    pub databases: Vec<DatabaseSchema>,
    /// Secret fields to overwrite
    #[serde(default)]
    pub secrets: Vec<SecretSchema>,
    /// Deployments to restart
    #[serde(default)]
    pub deployments: Vec<DeploymentSchema>,
}

/// One grant target
#[derive(Debug, Deserialize)]
pub struct DatabaseSchema {
    /// Database name
    pub name: String,
    /// Schemas inside it
    #[serde(default)]
    pub schemas: Vec<String>,
}

/// One secret field
#[derive(Debug, Deserialize)]
pub struct SecretSchema {
    /// Secret-store document
    pub container: String,
    /// Field inside the document
    pub key: String,
    /// Database the connection string points at
    pub database_name: String,
}

/// One deployment resource
#[derive(Debug, Deserialize)]
pub struct DeploymentSchema {
    /// Base URL of the restart endpoint
    pub url: String,
    /// Application name
    pub application: String,
    /// Resource namespace
    pub namespace: String,
    /// Resource name
    pub resource_name: String,
}

impl ConfigFile {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}

// ── Environment input ───────────────────────────────────────────────────────

/// Environment-derived run inputs, collected once at process start
#[derive(Clone)]
pub struct EnvironmentInput {
    /// Long-lived derivation seed
    pub seed: String,
    /// Rotation epoch for this run
    pub timestamp: String,
    /// Admin password when the file omits it
    pub admin_password: Option<String>,
    /// Bearer token for the restart endpoint
    pub argocd_token: Option<String>,
}

impl std::fmt::Debug for EnvironmentInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentInput")
            .field("seed", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "argocd_token",
                &self.argocd_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// Fully-resolved configuration: run context plus derived fleet
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Client identifier
    pub client: String,
    /// Process-scoped run context
    pub run: RotationRun,
    /// Fleet in configuration order, credentials already derived
    pub service_users: Vec<ServiceUser>,
}

impl RotationConfig {
    /// Resolve a parsed file against the environment input.
    ///
    /// Every password is derived exactly once, here. The admin password is
    /// never auto-generated: the file value wins when present and
    /// non-empty, the environment value is the fallback, and absence of
    /// both is a startup error.
    pub fn resolve(file: ConfigFile, env: &EnvironmentInput) -> Result<Self, ConfigError> {
        let admin_password = file
            .cluster
            .admin_password
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| env.admin_password.clone().filter(|p| !p.is_empty()))
            .ok_or_else(|| ConfigError::MissingValue {
                field: "cluster.admin_password (or KEYTURN_ADMIN_PASSWORD)".into(),
            })?;

        let cluster = ClusterConfig {
            host: file.cluster.host,
            port: file.cluster.port,
            admin_user: file.cluster.admin_user,
            admin_password,
        };

        let mut run = RotationRun::new(&env.seed, &env.timestamp, cluster);
        if let Some(token) = &env.argocd_token {
            run = run.with_argocd_token(token);
        }

        let service_users = file
            .service_users
            .into_iter()
            .map(|schema| resolve_service_user(schema, env))
            .collect();

        Ok(Self {
            client: file.client,
            run,
            service_users,
        })
    }
}

fn resolve_service_user(schema: ServiceUserSchema, env: &EnvironmentInput) -> ServiceUser {
    let username = format!("{}_{}", schema.username_prefix, env.timestamp);
    let password = derive_password(&env.seed, &env.timestamp, &username);

    ServiceUser {
        username,
        password,
        databases: schema
            .databases
            .into_iter()
            .map(|d| DatabaseGrant {
                name: d.name,
                schemas: d.schemas,
            })
            .collect(),
        secrets: schema
            .secrets
            .into_iter()
            .map(|s| SecretTarget {
                container: s.container,
                key: s.key,
                database_name: s.database_name,
            })
            .collect(),
        deployments: schema
            .deployments
            .into_iter()
            .map(|d| Deployment {
                url: d.url,
                application: d.application,
                namespace: d.namespace,
                resource_name: d.resource_name,
            })
            .collect(),
    }
}
