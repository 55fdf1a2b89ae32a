//! HTTP blob storage client.
//!
//! Archives snapshot and status text blobs in an object store over its REST
//! API. Writes are create-only: an `If-None-Match: *` precondition makes the
//! store refuse to overwrite an existing blob, which is what keeps the dated
//! snapshots immutable.

use std::time::Duration;

use domain::services::{SnapshotStore, StoreError};
use reqwest::{header, StatusCode};
use tracing::{debug, error};

use crate::config::StorageConfig;

/// Blob storage client scoped to a single container.
pub struct BlobStoreService {
    client: reqwest::Client,
    base_url: String,
    container: String,
    api_token: String,
}

impl BlobStoreService {
    /// Create a client for the given container of the configured store.
    pub fn new(config: &StorageConfig, container: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to construct blob store HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            container: container.to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn blob_url(&self, key: &str) -> String {
        format!("{}/{}/{}.txt", self.base_url, self.container, key)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for BlobStoreService {
    async fn write(&self, key: &str, text: &str) -> Result<(), StoreError> {
        let url = self.blob_url(key);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .header(header::IF_NONE_MATCH, "*")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(text.to_string())
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("blob write failed: {}", e)))?;

        match response.status() {
            s if s.is_success() => {
                debug!(key = %key, container = %self.container, bytes = text.len(), "Blob written");
                Ok(())
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            status => {
                let detail = response.text().await.unwrap_or_default();
                error!(key = %key, status = %status, "Blob store rejected write");
                Err(StoreError::Transport(format!(
                    "blob store returned {}: {}",
                    status, detail
                )))
            }
        }
    }

    async fn read(&self, key: &str) -> Result<String, StoreError> {
        let url = self.blob_url(key);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("blob read failed: {}", e)))?;

        match response.status() {
            s if s.is_success() => response
                .text()
                .await
                .map_err(|e| StoreError::Transport(format!("blob body read failed: {}", e))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(key.to_string())),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(StoreError::Transport(format!(
                    "blob store returned {}: {}",
                    status, detail
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StorageConfig {
        StorageConfig {
            base_url: "https://archive.example.net/".to_string(),
            api_token: "token".to_string(),
            results_container: "results".to_string(),
            status_container: "smoketests".to_string(),
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_blob_url_includes_container_and_extension() {
        let service = BlobStoreService::new(&test_config(), "results");
        assert_eq!(
            service.blob_url("visitors20250601"),
            "https://archive.example.net/results/visitors20250601.txt"
        );
    }

    #[test]
    fn test_blob_url_trims_trailing_slash() {
        let service = BlobStoreService::new(&test_config(), "smoketests");
        assert!(!service.blob_url("smoketests_20250601").contains("//smoketests"));
    }
}
