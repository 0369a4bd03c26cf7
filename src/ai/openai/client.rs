use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::error::truncate_body;
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

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

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to OpenAI: {}", e);
                Error::UpstreamUnavailable(format!("OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("OpenAI response body unreadable: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!(
                "OpenAI API error (status {}): {}",
                status,
                truncate_body(&body)
            );
            return Err(Error::UpstreamUnavailable(format!(
                "OpenAI API error (status {}): {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse OpenAI response: {}\nBody: {}",
                e,
                truncate_body(&body)
            );
            Error::UpstreamUnavailable(format!("Failed to parse OpenAI response: {}", e))
        })
    }

    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.post("/v1/chat/completions", &request).await
    }
}
