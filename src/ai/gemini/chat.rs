use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ThinkingConfig,
};
use crate::ai::{ChatPrompt, ChatService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    /// Flash models think by default and can be told not to; Pro models cannot.
    fn thinking_config(model: &str) -> Option<ThinkingConfig> {
        model
            .contains("flash")
            .then_some(ThinkingConfig { thinking_budget: 0 })
    }

    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts = &response.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::text(None, &prompt.system)),
            contents: vec![Content::text(Some("user"), &prompt.user)],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(prompt.max_tokens),
                thinking_config: Self::thinking_config(&prompt.model),
            }),
        };

        let response: GenerateContentResponse = self
            .http
            .generate_content(&prompt.model, &request)
            .await?;

        Self::extract_text(&response)
            .ok_or_else(|| Error::InterpretationFailed("No text in Gemini response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(60);

    fn prompt(model: &str) -> ChatPrompt {
        ChatPrompt {
            model: model.to_string(),
            system: "Interpret dreams.".to_string(),
            user: "A staircase to the sea.".to_string(),
            max_tokens: 200,
        }
    }

    #[tokio::test]
    async fn test_complete_joins_text_parts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "maxOutputTokens": 200 },
                "system_instruction": { "parts": [{ "text": "Interpret dreams." }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "The sea is " }, { "text": "the unconscious." }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiChatClient::new("g-key".to_string(), TIMEOUT).with_base_url(server.uri());

        let text = client.complete(&prompt("gemini-2.5-flash")).await.unwrap();
        assert_eq!(text, "The sea is the unconscious.");
    }

    #[tokio::test]
    async fn test_flash_models_spend_token_budget_on_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {
                    "maxOutputTokens": 200,
                    "thinkingConfig": { "thinkingBudget": 0 }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiChatClient::new("k".to_string(), TIMEOUT).with_base_url(server.uri());

        client.complete(&prompt("gemini-2.5-flash")).await.unwrap();
    }

    #[test]
    fn test_pro_models_keep_default_thinking() {
        assert!(GeminiChatClient::thinking_config("gemini-2.5-pro").is_none());
        assert!(GeminiChatClient::thinking_config("gemini-2.5-flash-lite").is_some());
    }

    #[tokio::test]
    async fn test_complete_strips_models_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GeminiChatClient::new("k".to_string(), TIMEOUT).with_base_url(server.uri());

        client
            .complete(&prompt("models/gemini-2.5-flash"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_candidates_is_interpretation_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })),
            )
            .mount(&server)
            .await;

        let client =
            GeminiChatClient::new("k".to_string(), TIMEOUT).with_base_url(server.uri());

        let err = client.complete(&prompt("gemini-2.5-flash")).await.unwrap_err();
        assert!(matches!(err, Error::InterpretationFailed(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_upstream_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client =
            GeminiChatClient::new("bad".to_string(), TIMEOUT).with_base_url(server.uri());

        let err = client.complete(&prompt("gemini-2.5-flash")).await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
