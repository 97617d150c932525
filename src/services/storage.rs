//! Object storage access
//!
//! Ingestion fetches uploaded documents from the bucket named in the
//! storage event. `ObjectStore` keeps the transport swappable; tests use
//! the in-memory fake.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>>;
}

/// Fetches objects over the storage provider's public HTTP surface
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}/{}", self.base_url, bucket, object);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                service: "object-storage".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream {
                service: "object-storage".to_string(),
                message: format!("Fetch of {}/{} returned HTTP {}", bucket, object, response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| AppError::Upstream {
            service: "object-storage".to_string(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// In-memory object store for tests
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct FakeObjectStore {
        objects: RwLock<HashMap<String, Vec<u8>>>,
    }

    impl FakeObjectStore {
        pub async fn put(&self, bucket: &str, object: &str, bytes: Vec<u8>) {
            self.objects
                .write()
                .await
                .insert(format!("{}/{}", bucket, object), bytes);
        }
    }

    #[async_trait]
    impl ObjectStore for FakeObjectStore {
        async fn fetch(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
            self.objects
                .read()
                .await
                .get(&format!("{}/{}", bucket, object))
                .cloned()
                .ok_or_else(|| AppError::Upstream {
                    service: "object-storage".to_string(),
                    message: format!("No such object: {}/{}", bucket, object),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_store_is_upstream_error() {
        let config = StorageConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
        };
        let store = HttpObjectStore::new(&config).unwrap();

        let err = store.fetch("uploads", "u1/resume.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_fake_store_round_trip() {
        let store = fake::FakeObjectStore::default();
        store.put("uploads", "u1/resume.txt", b"text".to_vec()).await;
        assert_eq!(store.fetch("uploads", "u1/resume.txt").await.unwrap(), b"text");
        assert!(store.fetch("uploads", "missing").await.is_err());
    }
}
