//! Service-user domain types
//!
//! One [`ServiceUser`] is one rotation unit: a principal plus the databases
//! it must reach, the secret fields advertising its connection strings, and
//! the deployments that must reload after rotation. Constructed once per
//! run from configuration plus the run context; immutable thereafter; never
//! persisted by this system.

/// A database role name plus its password
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Role name
    pub username: String,
    /// Role password
    pub password: String,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One database a principal must be able to connect to and operate on
///
/// No ownership semantics beyond "grantee": the role receives connect on
/// the database and full privileges on the listed schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseGrant {
    /// Database name
    pub name: String,
    /// Schemas to grant usage/create and object privileges on
    pub schemas: Vec<String>,
}

/// One secret-store field to overwrite with a fresh connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTarget {
    /// Secret-store document identifier
    pub container: String,
    /// Field inside the document
    pub key: String,
    /// Database the connection string points at
    pub database_name: String,
}

/// One deployment resource to restart after rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Base URL of the Argo CD-compatible API
    pub url: String,
    /// Application the resource belongs to
    pub application: String,
    /// Resource namespace
    pub namespace: String,
    /// Deployment resource name
    pub resource_name: String,
}

/// One rotation unit
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceUser {
    /// Derived role name (configured prefix + run timestamp)
    pub username: String,
    /// Derived password (see [`crate::utils::derive_password`])
    pub password: String,
    /// Databases the principal is granted against
    pub databases: Vec<DatabaseGrant>,
    /// Secret fields advertising this principal's connection strings
    pub secrets: Vec<SecretTarget>,
    /// Deployments to restart once the secret is current
    pub deployments: Vec<Deployment>,
}

impl ServiceUser {
    /// The principal this unit provisions
    pub fn principal(&self) -> Principal {
        Principal {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl std::fmt::Debug for ServiceUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceUser")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("databases", &self.databases)
            .field("secrets", &self.secrets)
            .field("deployments", &self.deployments)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let user = ServiceUser {
            username: "svc_1700000000".into(),
            password: "deadbeef".into(),
            databases: vec![],
            secrets: vec![],
            deployments: vec![],
        };
        let printed = format!("{user:?}");
        assert!(printed.contains("svc_1700000000"));
        assert!(!printed.contains("deadbeef"));
    }

    #[test]
    fn test_principal_carries_both_fields() {
        let user = ServiceUser {
            username: "svc_a".into(),
            password: "pw".into(),
            databases: vec![],
            secrets: vec![],
            deployments: vec![],
        };
        let principal = user.principal();
        assert_eq!(principal.username, "svc_a");
        assert_eq!(principal.password, "pw");
    }
}
