//! In-memory secret store (always available)
//!
//! Backs pipeline tests without a network. Supports one-shot failure
//! injection and operation counters so tests can assert exactly which
//! calls were made.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::core::SecretError;

use super::{SecretDocument, SecretStore};

/// In-memory implementation of [`SecretStore`]
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    documents: DashMap<String, SecretDocument>,
    fail_next_get: AtomicBool,
    fail_next_put: AtomicBool,
    get_count: AtomicU32,
    put_count: AtomicU32,
}

impl MemorySecretStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a container (builder pattern)
    #[must_use]
    pub fn with_document(self, container: impl Into<String>, document: SecretDocument) -> Self {
        self.documents.insert(container.into(), document);
        self
    }

    /// Current contents of a container, if present
    #[must_use]
    pub fn document(&self, container: &str) -> Option<SecretDocument> {
        self.documents
            .get(container)
            .map(|entry| entry.value().clone())
    }

    /// Make the next `get` fail with `FetchFailed`
    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }

    /// Make the next `put` fail with `WriteFailed`
    pub fn fail_next_put(&self) {
        self.fail_next_put.store(true, Ordering::SeqCst);
    }

    /// Number of `get` calls observed
    pub fn get_count(&self) -> u32 {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Number of `put` calls observed
    pub fn put_count(&self) -> u32 {
        self.put_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, container: &str) -> Result<SecretDocument, SecretError> {
        self.get_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_get.swap(false, Ordering::SeqCst) {
            return Err(SecretError::FetchFailed {
                reason: "injected failure".into(),
            });
        }

        self.documents
            .get(container)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SecretError::MalformedDocument {
                reason: "secret does not exist".into(),
            })
    }

    async fn put(&self, container: &str, document: &SecretDocument) -> Result<(), SecretError> {
        self.put_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(SecretError::WriteFailed {
                reason: "injected failure".into(),
            });
        }

        self.documents
            .insert(container.to_string(), document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> SecretDocument {
        serde_json::from_str(json).expect("test document parses")
    }

    #[tokio::test]
    async fn test_get_put_roundtrip() {
        let store = MemorySecretStore::new().with_document("c", document(r#"{"k":"v"}"#));

        let mut doc = store.get("c").await.unwrap();
        doc.insert("k2".into(), serde_json::Value::String("v2".into()));
        store.put("c", &doc).await.unwrap();

        assert_eq!(store.document("c").unwrap().len(), 2);
        assert_eq!(store.get_count(), 1);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let store = MemorySecretStore::new().with_document("c", document("{}"));

        store.fail_next_get();
        assert!(matches!(
            store.get("c").await,
            Err(SecretError::FetchFailed { .. })
        ));
        assert!(store.get("c").await.is_ok());

        store.fail_next_put();
        assert!(matches!(
            store.put("c", &document("{}")).await,
            Err(SecretError::WriteFailed { .. })
        ));
        assert!(store.put("c", &document("{}")).await.is_ok());
    }
}
