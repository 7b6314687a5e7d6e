//! Argo CD restart trigger

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::core::{Deployment, RestartError};

use super::{RestartTrigger, build_restart_url};

/// The action body understood by the resource-actions endpoint: a literal
/// JSON string.
const RESTART_BODY: &str = "\"restart\"";

/// Restart trigger against an Argo CD-compatible API with bearer-token
/// auth
#[derive(Debug, Clone)]
pub struct ArgoCdTrigger {
    client: reqwest::Client,
    token: String,
}

impl ArgoCdTrigger {
    /// Create a trigger with a fresh HTTP client
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl RestartTrigger for ArgoCdTrigger {
    #[tracing::instrument(skip(self, deployment), fields(resource = %deployment.resource_name))]
    async fn restart(&self, deployment: &Deployment) -> Result<(), RestartError> {
        let url = build_restart_url(deployment)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .body(RESTART_BODY)
            .send()
            .await
            .map_err(|e| RestartError::Request {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Triggered restart");
            Ok(())
        } else {
            Err(RestartError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
