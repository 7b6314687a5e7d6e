//! AWS Secrets Manager store
//!
//! Documents live as JSON strings in Secrets Manager secrets. The client
//! uses the default credential chain (environment, shared credentials
//! file, instance role); `endpoint_url` overrides the target for
//! LocalStack-style testing.

use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;

use crate::core::SecretError;

use super::{SecretDocument, SecretStore};

/// AWS Secrets Manager configuration
#[derive(Debug, Clone, Default)]
pub struct AwsSecretsStoreConfig {
    /// AWS region (auto-detected from the environment if `None`)
    pub region: Option<String>,

    /// Custom endpoint URL (for LocalStack or other AWS-compatible
    /// services)
    pub endpoint_url: Option<String>,
}

/// Secret store backed by AWS Secrets Manager
#[derive(Clone)]
pub struct AwsSecretsStore {
    client: SecretsManagerClient,
}

impl std::fmt::Debug for AwsSecretsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsStore").finish_non_exhaustive()
    }
}

impl AwsSecretsStore {
    /// Initialize the SDK client from the default credential chain
    pub async fn new(config: AwsSecretsStoreConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let client = SecretsManagerClient::new(&sdk_config);

        tracing::info!(
            region = ?config.region,
            endpoint = ?config.endpoint_url,
            "Initialized Secrets Manager store"
        );

        Self { client }
    }

    /// Wrap an existing SDK client
    pub fn with_client(client: SecretsManagerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsStore {
    #[tracing::instrument(skip(self), fields(container = %container))]
    async fn get(&self, container: &str) -> Result<SecretDocument, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(container)
            .send()
            .await
            .map_err(|e| {
                let reason = e.to_string();
                if reason.contains("ResourceNotFoundException") {
                    SecretError::MalformedDocument {
                        reason: "secret does not exist".into(),
                    }
                } else {
                    SecretError::FetchFailed { reason }
                }
            })?;

        let payload = output
            .secret_string()
            .ok_or_else(|| SecretError::MalformedDocument {
                reason: "secret has no string payload".into(),
            })?;

        serde_json::from_str(payload).map_err(|e| SecretError::MalformedDocument {
            reason: format!("payload is not a JSON object: {e}"),
        })
    }

    #[tracing::instrument(skip(self, document), fields(container = %container))]
    async fn put(&self, container: &str, document: &SecretDocument) -> Result<(), SecretError> {
        let body = serde_json::to_string(document).map_err(|e| SecretError::EncodeFailed {
            reason: e.to_string(),
        })?;

        self.client
            .put_secret_value()
            .secret_id(container)
            .secret_string(body)
            .send()
            .await
            .map_err(|e| SecretError::WriteFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!("Wrote secret document");
        Ok(())
    }
}
