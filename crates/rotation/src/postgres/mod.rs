//! Database principal provisioning
//!
//! Ensures a Postgres role exists with the derived password and the
//! required grants, inside one serializable transaction per principal.
//! Serializable isolation is the mutual exclusion between concurrent
//! rotation runs against the same cluster: the role-existence check and
//! the create/alter cannot interleave with another run's.

pub mod statements;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use crate::core::{ClusterConfig, DatabaseGrant, Principal, ProvisionError};

use statements::Statement;

/// Seam for database principal provisioning
///
/// The production implementation is [`PostgresProvisioner`]; tests use
/// [`crate::testing::FakeProvisioner`].
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Ensure the role exists with the given password and grants.
    ///
    /// Idempotent: provisioning the same principal twice with the same
    /// password leaves the role and its grant set unchanged. Any statement
    /// failure aborts the whole transaction - a principal is never left
    /// half-provisioned. Not retried internally; the caller decides
    /// whether to retry the whole run.
    async fn provision(
        &self,
        principal: &Principal,
        grants: &[DatabaseGrant],
    ) -> Result<(), ProvisionError>;
}

/// sqlx-backed provisioner over an admin connection to the bootstrap
/// `postgres` database
pub struct PostgresProvisioner {
    pool: PgPool,
}

impl PostgresProvisioner {
    /// Connect to the cluster's bootstrap database with the admin
    /// credential.
    ///
    /// The pool is capped at one connection: provisioning is sequential by
    /// design, and a single session keeps transaction ordering obvious.
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self, ProvisionError> {
        let options = PgConnectOptions::new()
            .host(&cluster.host)
            .port(cluster.port)
            .username(&cluster.admin_user)
            .password(&cluster.admin_password)
            .database("postgres");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| ProvisionError::Connection {
                reason: e.to_string(),
            })?;

        tracing::info!(host = %cluster.host, port = cluster.port, "Connected to admin cluster");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (useful when the caller manages connections)
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        statement: &Statement,
    ) -> Result<(), ProvisionError> {
        sqlx::query(&statement.sql)
            .execute(&mut **tx)
            .await
            .map_err(|e| ProvisionError::Statement {
                statement: statement.display.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl Provisioner for PostgresProvisioner {
    #[tracing::instrument(skip(self, principal, grants), fields(username = %principal.username))]
    async fn provision(
        &self,
        principal: &Principal,
        grants: &[DatabaseGrant],
    ) -> Result<(), ProvisionError> {
        // An error return drops `tx`, which rolls the transaction back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ProvisionError::Transaction {
                reason: e.to_string(),
            })?;

        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| ProvisionError::Transaction {
                reason: e.to_string(),
            })?;

        let exists: bool = sqlx::query_scalar(statements::ROLE_EXISTS)
            .bind(&principal.username)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ProvisionError::Statement {
                statement: statements::ROLE_EXISTS.to_string(),
                reason: e.to_string(),
            })?;

        let ensure = statements::ensure_role(principal, exists);
        Self::execute(&mut tx, &ensure).await?;
        tracing::debug!(existed = exists, "Ensured role");

        for grant in grants {
            for statement in statements::grant_statements(&principal.username, grant) {
                Self::execute(&mut tx, &statement).await?;
            }
            tracing::debug!(database = %grant.name, "Granted database access");
        }

        tx.commit().await.map_err(|e| ProvisionError::Transaction {
            reason: e.to_string(),
        })?;

        tracing::info!(existed = exists, "Provisioned principal");
        Ok(())
    }
}
