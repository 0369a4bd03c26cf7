use crate::error::truncate_body;
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Calls `generateContent` for `model`.
    ///
    /// `model` may be a bare ID (`gemini-2.5-flash`) or `models/`-prefixed.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model: &str,
        request: &Req,
    ) -> Result<Resp> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                Error::UpstreamUnavailable(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("Gemini response body unreadable: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!(
                "Gemini API error (status {}): {}",
                status,
                truncate_body(&body)
            );
            return Err(Error::UpstreamUnavailable(format!(
                "Gemini API error (status {}): {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse Gemini response: {}\nBody: {}",
                e,
                truncate_body(&body)
            );
            Error::UpstreamUnavailable(format!("Failed to parse Gemini response: {}", e))
        })
    }
}
