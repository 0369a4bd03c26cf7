use super::{
    file_name_from_url, unique_name, LocalMedia, MediaStorage, StoredMedia, UploadPolicy,
};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockMediaStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    policy: UploadPolicy,
    store_count: Arc<Mutex<usize>>,
    fetch_count: Arc<Mutex<usize>>,
}

impl MockMediaStorage {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "http://localhost:3001/uploads".to_string(),
            policy: UploadPolicy::new(DEFAULT_MAX_UPLOAD_BYTES),
            store_count: Arc::new(Mutex::new(0)),
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.policy = UploadPolicy::new(max_bytes);
        self
    }

    pub fn with_file(self, name: String, content: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(name, content);
        self
    }

    /// URL this storage would mint for `name`.
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    pub fn get_store_count(&self) -> usize {
        *self.store_count.lock().unwrap()
    }

    pub fn get_fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockMediaStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStorage for MockMediaStorage {
    async fn store(
        &self,
        data: &[u8],
        declared_mime: &str,
        file_name: Option<&str>,
    ) -> Result<StoredMedia> {
        *self.store_count.lock().unwrap() += 1;

        let extension = self
            .policy
            .check(data.len() as u64, declared_mime, file_name)?;
        let name = unique_name(&extension);

        self.files
            .lock()
            .unwrap()
            .insert(name.clone(), data.to_vec());

        Ok(StoredMedia {
            url: self.url_for(&name),
            file_name: name,
            size_bytes: data.len() as u64,
        })
    }

    async fn fetch_local(&self, url: &str) -> Result<Option<LocalMedia>> {
        *self.fetch_count.lock().unwrap() += 1;

        if !url.starts_with(&self.base_url) {
            return Ok(None);
        }
        let file_name = file_name_from_url(url)
            .ok_or_else(|| Error::SourceUnavailable(format!("No file name in URL: {}", url)))?;

        let files = self.files.lock().unwrap();
        match files.get(&file_name) {
            Some(data) => Ok(Some(LocalMedia {
                file_name,
                data: data.clone(),
            })),
            None => Err(Error::SourceUnavailable(format!(
                "File not found: {}",
                file_name
            ))),
        }
    }
}
