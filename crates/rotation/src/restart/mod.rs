//! Deployment restart triggering
//!
//! After a service user's secret is current, its deployments are told to
//! reload via a single idempotent HTTP action. Any 2xx is success; a
//! non-2xx is a reported failure for that resource and is not retried.

mod argocd;

pub use argocd::ArgoCdTrigger;

use async_trait::async_trait;
use url::Url;

use crate::core::{Deployment, RestartError};

/// Seam for the restart endpoint
///
/// Production implementation is [`ArgoCdTrigger`]; tests use
/// [`crate::testing::FakeRestartTrigger`].
#[async_trait]
pub trait RestartTrigger: Send + Sync {
    /// Signal one deployment resource to restart
    async fn restart(&self, deployment: &Deployment) -> Result<(), RestartError>;
}

/// Build the resource-action URL for one deployment
pub fn build_restart_url(deployment: &Deployment) -> Result<Url, RestartError> {
    let base = deployment.url.trim_end_matches('/');
    let mut url = Url::parse(&format!(
        "{base}/api/v1/applications/{}/resource/actions",
        deployment.application
    ))
    .map_err(|e| RestartError::InvalidEndpoint {
        url: deployment.url.clone(),
        reason: e.to_string(),
    })?;

    url.query_pairs_mut()
        .append_pair("namespace", &deployment.namespace)
        .append_pair("resourceName", &deployment.resource_name)
        .append_pair("version", "v1")
        .append_pair("kind", "Deployment")
        .append_pair("group", "apps");

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn deployment() -> Deployment {
        Deployment {
            url: "https://argocd.internal".into(),
            application: "billing".into(),
            namespace: "prod".into(),
            resource_name: "billing-api".into(),
        }
    }

    #[test]
    fn test_restart_url_shape() {
        let url = build_restart_url(&deployment()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://argocd.internal/api/v1/applications/billing/resource/actions\
             ?namespace=prod&resourceName=billing-api&version=v1&kind=Deployment&group=apps"
        );
    }

    #[test]
    fn test_restart_url_trims_trailing_slash() {
        let mut d = deployment();
        d.url = "https://argocd.internal/".into();
        let url = build_restart_url(&d).unwrap();
        assert!(
            url.as_str()
                .starts_with("https://argocd.internal/api/v1/applications/")
        );
    }

    #[test]
    fn test_restart_url_encodes_query_values() {
        let mut d = deployment();
        d.namespace = "team prod".into();
        let url = build_restart_url(&d).unwrap();
        assert!(url.as_str().contains("namespace=team+prod"));
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let mut d = deployment();
        d.url = "not a url".into();
        let err = build_restart_url(&d).unwrap_err();
        assert!(matches!(err, RestartError::InvalidEndpoint { .. }));
    }
}
