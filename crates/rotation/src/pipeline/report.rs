//! Rotation run report

use crate::core::RotationError;

/// Itemized outcome of one rotation run
///
/// Successes and failures are recorded in processing order with enough
/// context (username, container and key, resource name) to diagnose and
/// safely re-run.
#[derive(Debug, Default)]
pub struct RotationReport {
    /// Principals provisioned successfully
    pub provisioned: Vec<String>,
    /// Secret targets synchronized, as `container[key]` labels
    pub synced: Vec<String>,
    /// Deployment resources restarted
    pub restarted: Vec<String>,
    /// Units not attempted (failed dependency, cancellation, or fail-fast)
    pub skipped: Vec<String>,
    /// Every failure, in occurrence order
    pub failures: Vec<RotationError>,
}

impl RotationReport {
    /// Whether the run completed with zero failures
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total units that completed successfully
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.provisioned.len() + self.synced.len() + self.restarted.len()
    }
}

impl std::fmt::Display for RotationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "provisioned {} principal(s), synced {} secret(s), restarted {} deployment(s), \
             skipped {} unit(s), {} failure(s)",
            self.provisioned.len(),
            self.synced.len(),
            self.restarted.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProvisionError, RotationError};

    #[test]
    fn test_empty_report_is_success() {
        let report = RotationReport::default();
        assert!(report.is_success());
        assert_eq!(report.success_count(), 0);
    }

    #[test]
    fn test_any_failure_flips_success() {
        let mut report = RotationReport::default();
        report.provisioned.push("svc_a".into());
        report.failures.push(RotationError::Provision {
            username: "svc_b".into(),
            source: ProvisionError::Connection {
                reason: "refused".into(),
            },
        });

        assert!(!report.is_success());
        assert_eq!(report.success_count(), 1);
    }

    #[test]
    fn test_display_summarizes_counts() {
        let mut report = RotationReport::default();
        report.provisioned.push("svc_a".into());
        report.synced.push("my-secret[DB_URL]".into());

        let line = report.to_string();
        assert!(line.contains("provisioned 1"));
        assert!(line.contains("synced 1"));
        assert!(line.contains("0 failure(s)"));
    }
}
