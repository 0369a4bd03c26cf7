use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage};
use crate::ai::{ChatPrompt, ChatService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let request = ChatCompletionRequest {
            model: prompt.model.clone(),
            messages: vec![
                ChatMessage::system(&prompt.system),
                ChatMessage::user(&prompt.user),
            ],
            max_completion_tokens: prompt.max_tokens,
        };

        let response = self.http.chat_completion(request).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::InterpretationFailed("No choices from OpenAI".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("OpenAI completion hit the token limit ({})", prompt.max_tokens);
        }

        choice
            .message
            .content
            .clone()
            .ok_or_else(|| Error::InterpretationFailed("No content from OpenAI".to_string()))
    }
}
