//! Test doubles for the external seams (always available)
//!
//! [`FakeProvisioner`] simulates the cluster's role table so tests can
//! assert create-vs-alter behavior and idempotence without a database.
//! [`FakeRestartTrigger`] records which resources were signalled. The
//! in-memory secret store lives with the other stores as
//! [`crate::secrets::MemorySecretStore`].

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::{DatabaseGrant, Deployment, Principal, ProvisionError, RestartError};
use crate::postgres::Provisioner;
use crate::restart::RestartTrigger;

/// In-memory [`Provisioner`] with a simulated role table
#[derive(Debug, Default)]
pub struct FakeProvisioner {
    roles: DashMap<String, String>,
    provisioned: Mutex<Vec<String>>,
    fail_for: DashMap<String, String>,
    created: AtomicU32,
    altered: AtomicU32,
}

impl FakeProvisioner {
    /// Create an empty fake with no pre-existing roles
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make provisioning fail for one username
    pub fn fail_for(&self, username: impl Into<String>, reason: impl Into<String>) {
        self.fail_for.insert(username.into(), reason.into());
    }

    /// Usernames provisioned, in call order
    pub fn provisioned(&self) -> Vec<String> {
        self.provisioned.lock().expect("lock poisoned").clone()
    }

    /// Current password of a simulated role
    pub fn role_password(&self, username: &str) -> Option<String> {
        self.roles.get(username).map(|entry| entry.value().clone())
    }

    /// Number of roles created (role did not exist)
    pub fn created_count(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of roles altered (role already existed)
    pub fn altered_count(&self) -> u32 {
        self.altered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn provision(
        &self,
        principal: &Principal,
        _grants: &[DatabaseGrant],
    ) -> Result<(), ProvisionError> {
        if let Some(reason) = self.fail_for.get(&principal.username) {
            return Err(ProvisionError::Statement {
                statement: "GRANT CONNECT".into(),
                reason: reason.value().clone(),
            });
        }

        self.provisioned
            .lock()
            .expect("lock poisoned")
            .push(principal.username.clone());

        // Ensure semantics: create when absent, alter when present. Either
        // way the role ends up with the given password - never an error.
        if self.roles.contains_key(&principal.username) {
            self.altered.fetch_add(1, Ordering::SeqCst);
        } else {
            self.created.fetch_add(1, Ordering::SeqCst);
        }
        self.roles
            .insert(principal.username.clone(), principal.password.clone());

        Ok(())
    }
}

/// Recording [`RestartTrigger`]
#[derive(Debug, Default)]
pub struct FakeRestartTrigger {
    restarted: Mutex<Vec<String>>,
    fail_for: DashMap<String, u16>,
}

impl FakeRestartTrigger {
    /// Create a trigger that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make restarts of one resource fail with an HTTP status
    pub fn fail_for(&self, resource_name: impl Into<String>, status: u16) {
        self.fail_for.insert(resource_name.into(), status);
    }

    /// Resource names restarted, in call order
    pub fn restarted(&self) -> Vec<String> {
        self.restarted.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl RestartTrigger for FakeRestartTrigger {
    async fn restart(&self, deployment: &Deployment) -> Result<(), RestartError> {
        if let Some(status) = self.fail_for.get(&deployment.resource_name) {
            return Err(RestartError::Rejected {
                status: *status.value(),
            });
        }

        self.restarted
            .lock()
            .expect("lock poisoned")
            .push(deployment.resource_name.clone());
        Ok(())
    }
}
