use super::{unique_name, LocalMedia, MediaStorage, StoredMedia, UploadPolicy};
use crate::config::CdnConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

const KEY_PREFIX: &str = "uploads";

/// Stores uploads as public-read objects in S3-compatible storage.
pub struct S3MediaStorage {
    client: S3Client,
    bucket: String,
    base_url: String,
    policy: UploadPolicy,
}

impl S3MediaStorage {
    pub async fn new(cdn: &CdnConfig, policy: UploadPolicy) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            cdn.access_key_id.clone(),
            cdn.secret_access_key.clone(),
            None,
            None,
            "digital-ocean-spaces",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1")) // Spaces ignores the region
            .endpoint_url(cdn.endpoint.clone())
            .load()
            .await;

        Ok(Self {
            client: S3Client::new(&config),
            bucket: cdn.bucket.clone(),
            base_url: cdn.base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl MediaStorage for S3MediaStorage {
    async fn store(
        &self,
        data: &[u8],
        declared_mime: &str,
        file_name: Option<&str>,
    ) -> Result<StoredMedia> {
        let extension = self
            .policy
            .check(data.len() as u64, declared_mime, file_name)?;
        let name = unique_name(&extension);
        let key = format!("{}/{}", KEY_PREFIX, name);
        let content_type = super::mime::mime_for_extension(&extension).unwrap_or(declared_mime);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| Error::S3(format!("Failed to upload {}: {}", key, e)))?;

        let url = self.get_public_url(&key);
        tracing::info!("Stored upload {} ({} bytes) at {}", name, data.len(), url);

        Ok(StoredMedia {
            url,
            file_name: name,
            size_bytes: data.len() as u64,
        })
    }

    async fn fetch_local(&self, _url: &str) -> Result<Option<LocalMedia>> {
        // Public-read CDN objects are fetchable by providers as-is.
        Ok(None)
    }
}
