use super::types::{InitiateUploadRequest, InitiateUploadResponse};
use crate::error::truncate_body;
use crate::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_RUN_URL: &str = "https://fal.run";
const DEFAULT_STORAGE_URL: &str = "https://rest.alpha.fal.ai";

/// Shared fal.ai REST client used by the speech and media adapters.
#[derive(Clone)]
pub struct FalHttpClient {
    client: Client,
    api_key: String,
    run_url: String,
    storage_url: String,
    timeout: Duration,
}

impl FalHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            run_url: DEFAULT_RUN_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, run_url: String) -> Self {
        self.run_url = run_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_storage_url(mut self, storage_url: String) -> Self {
        self.storage_url = storage_url.trim_end_matches('/').to_string();
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .timeout(self.timeout)
            .header("Authorization", format!("Key {}", self.api_key))
    }

    async fn send_json<Resp: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<Resp> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send {} request to fal.ai: {}", what, e);
            Error::UpstreamUnavailable(format!("fal.ai {} request failed: {}", what, e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("fal.ai {} body unreadable: {}", what, e))
        })?;

        if !status.is_success() {
            tracing::error!(
                "fal.ai {} error (status {}): {}",
                what,
                status,
                truncate_body(&body)
            );
            return Err(Error::UpstreamUnavailable(format!(
                "fal.ai {} error (status {}): {}",
                what,
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse fal.ai {} response: {}\nBody: {}",
                what,
                e,
                truncate_body(&body)
            );
            Error::UpstreamUnavailable(format!("fal.ai {} returned non-JSON body: {}", what, e))
        })
    }

    /// Run `model` synchronously and return its output.
    pub async fn run<Req: Serialize + ?Sized>(
        &self,
        model: &str,
        input: &Req,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.run_url, model.trim_start_matches('/'));
        tracing::debug!("Submitting fal.ai job to {}", url);
        self.send_json(self.authorized(self.client.post(&url)).json(input), model)
            .await
    }

    /// Upload bytes to fal storage and return the public file URL.
    pub async fn upload(&self, data: Vec<u8>, content_type: &str, file_name: &str) -> Result<String> {
        let initiate_url = format!(
            "{}/storage/upload/initiate?storage_type=fal-cdn-v3",
            self.storage_url
        );
        let initiated: InitiateUploadResponse = self
            .send_json(
                self.authorized(self.client.post(&initiate_url))
                    .json(&InitiateUploadRequest {
                        content_type,
                        file_name,
                    }),
                "storage initiate",
            )
            .await?;

        let size = data.len();
        let response = self
            .client
            .put(&initiated.upload_url)
            .timeout(self.timeout)
            .header("Content-Type", content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to upload audio to fal storage: {}", e);
                Error::UpstreamUnavailable(format!("fal storage upload failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "fal storage upload error (status {}): {}",
                status,
                truncate_body(&body)
            );
            return Err(Error::UpstreamUnavailable(format!(
                "fal storage upload error (status {})",
                status
            )));
        }

        tracing::info!(
            "Uploaded {} ({} bytes) to fal storage: {}",
            file_name,
            size,
            initiated.file_url
        );
        Ok(initiated.file_url)
    }
}
