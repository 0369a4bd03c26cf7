use super::{file_name_from_url, unique_name, LocalMedia, MediaStorage, StoredMedia, UploadPolicy};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// URL path under which stored files are served back.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Stores uploads on local disk and serves them from `UPLOADS_ROUTE`.
pub struct LocalMediaStorage {
    dir: PathBuf,
    public_base_url: String,
    policy: UploadPolicy,
}

impl LocalMediaStorage {
    pub fn new(dir: &Path, public_base_url: String, policy: UploadPolicy) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Created upload directory: {}", dir.display());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}{}/{}", self.public_base_url, UPLOADS_ROUTE, name)
    }

    /// Whether `url` was minted by this service rather than a provider.
    fn is_local_url(&self, url: &str) -> bool {
        if url.starts_with(&format!("{}{}/", self.public_base_url, UPLOADS_ROUTE)) {
            return true;
        }
        reqwest::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
            .map(|host| {
                host == "localhost"
                    || host == "127.0.0.1"
                    || host == "[::1]"
                    || host.contains("ngrok")
            })
            .unwrap_or(false)
    }
}

/// Write `data` through `writer`, deleting `path` if the write does not finish.
async fn write_or_remove<W: AsyncWrite + Unpin>(
    writer: &mut W,
    path: &Path,
    data: &[u8],
) -> Result<()> {
    let written: std::io::Result<()> = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        tracing::error!("Failed to write {}: {}", path.display(), e);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!("Could not remove partial file {}: {}", path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
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
        let path = self.dir.join(&name);

        // create_new refuses to clobber a file written by a concurrent upload
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        write_or_remove(&mut file, &path, data).await?;

        let url = self.public_url(&name);
        tracing::info!("Stored upload {} ({} bytes) at {}", name, data.len(), url);

        Ok(StoredMedia {
            url,
            file_name: name,
            size_bytes: data.len() as u64,
        })
    }

    async fn fetch_local(&self, url: &str) -> Result<Option<LocalMedia>> {
        if !self.is_local_url(url) {
            return Ok(None);
        }

        let file_name = file_name_from_url(url)
            .ok_or_else(|| Error::SourceUnavailable(format!("No file name in URL: {}", url)))?;
        let path = self.dir.join(&file_name);
        tracing::debug!("Resolving local audio {} -> {}", url, path.display());

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(LocalMedia { file_name, data })),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::SourceUnavailable(format!(
                "File not found: {}",
                file_name
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
