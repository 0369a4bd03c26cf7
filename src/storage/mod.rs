//! Media storage for uploaded dream recordings
//!
//! Persists uploaded audio and hands back a URL that third-party providers
//! can fetch. Backed by local disk (served at `/uploads`) or S3-compatible
//! object storage (DigitalOcean Spaces).

pub mod local;
pub mod mime;
pub mod mock;
pub mod policy;
pub mod s3;

pub use local::LocalMediaStorage;
pub use mock::MockMediaStorage;
pub use policy::UploadPolicy;
pub use s3::S3MediaStorage;

use crate::config::{Config, StorageBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMedia {
    pub url: String,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Bytes read back from this service's own storage.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn store(
        &self,
        data: &[u8],
        declared_mime: &str,
        file_name: Option<&str>,
    ) -> Result<StoredMedia>;

    /// Load the file behind `url` when it points into this storage.
    ///
    /// `Ok(None)` means the URL is hosted elsewhere and is already reachable
    /// by providers. A URL that is ours but names a missing file is
    /// `Error::SourceUnavailable`.
    async fn fetch_local(&self, url: &str) -> Result<Option<LocalMedia>>;
}

/// Build the storage backend selected by `STORAGE_BACKEND`.
pub async fn from_config(config: &Config) -> Result<Arc<dyn MediaStorage>> {
    let policy = UploadPolicy::new(config.max_upload_bytes);
    match config.storage_backend {
        StorageBackend::Local => {
            tracing::info!(
                "Storage: local disk at {} (public base {})",
                config.upload_dir.display(),
                config.public_base_url
            );
            Ok(Arc::new(LocalMediaStorage::new(
                &config.upload_dir,
                config.public_base_url.clone(),
                policy,
            )?))
        }
        StorageBackend::S3 => {
            let cdn = config.cdn.as_ref().ok_or_else(|| {
                Error::Config("CDN settings missing for STORAGE_BACKEND=s3".to_string())
            })?;
            tracing::info!("Storage: S3 bucket {} at {}", cdn.bucket, cdn.endpoint);
            Ok(Arc::new(S3MediaStorage::new(cdn, policy).await?))
        }
    }
}

/// Collision-resistant object name: millisecond timestamp plus random suffix.
pub fn unique_name(extension: &str) -> String {
    format!(
        "rec_{}_{:08x}.{}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>(),
        extension.trim_start_matches('.')
    )
}

/// Final path segment of a URL, rejecting anything that could escape the
/// storage directory.
pub(crate) fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let name = urlencoding::decode(segment).ok()?.into_owned();
    let safe = !name.is_empty() && !name.contains(['/', '\\', '\0']) && !name.starts_with('.');
    safe.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name(".m4a");
        assert!(name.starts_with("rec_"));
        assert!(name.ends_with(".m4a"));
        assert!(!name.contains(".."));
    }

    #[test]
    fn test_unique_names_differ() {
        let a = unique_name("wav");
        let b = unique_name("wav");
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("http://localhost:3001/uploads/rec_1_ab.m4a").as_deref(),
            Some("rec_1_ab.m4a")
        );
        assert_eq!(file_name_from_url("http://localhost:3001/uploads/"), None);
        assert_eq!(
            file_name_from_url("http://localhost:3001/uploads/..%2Fsecret"),
            None
        );
        assert_eq!(file_name_from_url("not a url"), None);
    }

    #[test]
    fn test_file_name_from_url_decodes_segment() {
        assert_eq!(
            file_name_from_url("https://cdn.example.com/audio/my%20dream.m4a").as_deref(),
            Some("my dream.m4a")
        );
        assert_eq!(
            file_name_from_url("https://cdn.example.com/audio/%2e%2e%5csecret"),
            None
        );
        assert_eq!(file_name_from_url("https://cdn.example.com/a/%2Ehidden"), None);
        assert_eq!(file_name_from_url("https://cdn.example.com/a/%FF%FE"), None);
    }
}
