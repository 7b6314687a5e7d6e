//! Rotation run context
//!
//! One [`RotationRun`] is built at process start from environment and
//! configuration, then passed explicitly to every component. Core logic
//! never reads ambient global state, so the pipeline is testable with
//! synthetic contexts.

/// Admin connection parameters for the target Postgres cluster
#[derive(Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Cluster hostname
    pub host: String,
    /// Cluster port
    pub port: u16,
    /// Administrator role used for provisioning
    pub admin_user: String,
    /// Administrator password (resolved at startup, never auto-generated)
    pub admin_password: String,
}

impl std::fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"[REDACTED]")
            .finish()
    }
}

/// Process-scoped context for one rotation run
///
/// The `timestamp` is the single source of truth for this run: it suffixes
/// every username and feeds every password derivation. Re-running with the
/// same timestamp reproduces the same credentials (safe retries); a new
/// timestamp produces an entirely new, non-colliding set of principals.
#[derive(Clone)]
pub struct RotationRun {
    /// Long-lived derivation seed
    pub seed: String,
    /// Rotation epoch, shared by every credential in this run
    pub timestamp: String,
    /// Target cluster and admin credential
    pub cluster: ClusterConfig,
    /// Bearer token for the deployment restart endpoint, when configured
    pub argocd_token: Option<String>,
}

impl RotationRun {
    /// Create a run context
    pub fn new(
        seed: impl Into<String>,
        timestamp: impl Into<String>,
        cluster: ClusterConfig,
    ) -> Self {
        Self {
            seed: seed.into(),
            timestamp: timestamp.into(),
            cluster,
            argocd_token: None,
        }
    }

    /// Attach the restart-endpoint bearer token (builder pattern)
    pub fn with_argocd_token(mut self, token: impl Into<String>) -> Self {
        self.argocd_token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for RotationRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationRun")
            .field("seed", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .field("cluster", &self.cluster)
            .field(
                "argocd_token",
                &self.argocd_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cluster() -> ClusterConfig {
        ClusterConfig {
            host: "db.internal".into(),
            port: 5432,
            admin_user: "postgres".into(),
            admin_password: "s3cret".into(),
        }
    }

    #[test]
    fn test_run_builder() {
        let run = RotationRun::new("seed", "1700000000", test_cluster())
            .with_argocd_token("token-abc");

        assert_eq!(run.timestamp, "1700000000");
        assert_eq!(run.argocd_token.as_deref(), Some("token-abc"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let run = RotationRun::new("very-secret-seed", "1700000000", test_cluster())
            .with_argocd_token("token-abc");
        let printed = format!("{run:?}");

        assert!(!printed.contains("very-secret-seed"));
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("token-abc"));
        assert!(printed.contains("1700000000"));
        assert!(printed.contains("db.internal"));
    }
}
