//! Dream interpretation stage
//!
//! Standard gets a short plain summary, Premium a longer sectioned reading.
//! The tier decides the prompt, the model, and the token ceiling.

use crate::ai::{ChatPrompt, ChatService};
use crate::models::{Interpretation, Tier};
use crate::prompts::{interpretation_templates, render};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub const STANDARD_MAX_TOKENS: u32 = 200;
pub const PREMIUM_MAX_TOKENS: u32 = 800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretationModels {
    pub standard: String,
    pub premium: String,
}

impl InterpretationModels {
    pub fn for_tier(&self, tier: Tier) -> &str {
        match tier {
            Tier::Standard => &self.standard,
            Tier::Premium => &self.premium,
        }
    }
}

pub struct InterpretationGenerator {
    chat: Arc<dyn ChatService>,
    models: InterpretationModels,
    timeout: Duration,
}

impl InterpretationGenerator {
    pub fn new(chat: Arc<dyn ChatService>, models: InterpretationModels, timeout: Duration) -> Self {
        Self {
            chat,
            models,
            timeout,
        }
    }

    pub fn models(&self) -> &InterpretationModels {
        &self.models
    }

    /// Build the provider request for `dream_text` at `tier`.
    pub fn prompt(&self, dream_text: &str, tier: Tier) -> ChatPrompt {
        let (system, user) = interpretation_templates(tier);
        ChatPrompt {
            model: self.models.for_tier(tier).to_string(),
            system: system.trim().to_string(),
            user: render(user, &[("dream", dream_text.trim())]).trim().to_string(),
            max_tokens: match tier {
                Tier::Standard => STANDARD_MAX_TOKENS,
                Tier::Premium => PREMIUM_MAX_TOKENS,
            },
        }
    }

    pub async fn interpret(&self, dream_text: &str, tier: Tier) -> Result<Interpretation> {
        if dream_text.trim().is_empty() {
            return Err(Error::Validation("dreamText is required".to_string()));
        }

        let prompt = self.prompt(dream_text, tier);
        tracing::info!(
            "Interpreting dream with {} ({} tier, max {} tokens)",
            prompt.model,
            tier,
            prompt.max_tokens
        );

        let text = tokio::time::timeout(self.timeout, self.chat.complete(&prompt))
            .await
            .map_err(|_| {
                tracing::error!(
                    "Interpretation timed out after {}s",
                    self.timeout.as_secs()
                );
                Error::InterpretationFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                tracing::error!("Interpretation failed: {}", e);
                e.into_stage_failure(Error::InterpretationFailed)
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InterpretationFailed(
                "provider returned no text".to_string(),
            ));
        }

        let interpretation = Interpretation::new(text.to_string(), tier, prompt.model);
        tracing::info!("Interpretation ready ({} words)", interpretation.word_count);
        Ok(interpretation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockChatClient;

    fn models() -> InterpretationModels {
        InterpretationModels {
            standard: "gpt-4o-mini".to_string(),
            premium: "gpt-4o".to_string(),
        }
    }

    fn generator(chat: &MockChatClient, timeout: Duration) -> InterpretationGenerator {
        InterpretationGenerator::new(Arc::new(chat.clone()), models(), timeout)
    }

    #[tokio::test]
    async fn test_standard_prompt_policy() {
        let chat = MockChatClient::new().with_response("Short reading of the dream.");

        let interpretation = generator(&chat, Duration::from_secs(5))
            .interpret("I lost my teeth", Tier::Standard)
            .await
            .unwrap();

        assert_eq!(interpretation.model, "gpt-4o-mini");
        assert_eq!(interpretation.word_count, 5);

        let prompts = chat.get_prompts();
        assert_eq!(prompts[0].max_tokens, STANDARD_MAX_TOKENS);
        assert!(prompts[0].user.contains("I lost my teeth"));
    }

    #[tokio::test]
    async fn test_premium_prompt_policy() {
        let chat = MockChatClient::new();

        let interpretation = generator(&chat, Duration::from_secs(5))
            .interpret("I lost my teeth", Tier::Premium)
            .await
            .unwrap();

        assert_eq!(interpretation.model, "gpt-4o");
        assert_eq!(interpretation.tier, Tier::Premium);

        let prompt = &chat.get_prompts()[0];
        assert_eq!(prompt.max_tokens, PREMIUM_MAX_TOKENS);
        assert!(prompt.system.contains("Symbolism"));
        assert!(prompt.system.contains("Guidance"));
    }

    #[tokio::test]
    async fn test_repeated_calls_keep_the_same_shape() {
        let chat = MockChatClient::new()
            .with_response("one two three")
            .with_response("a much longer answer this time around");
        let generator = generator(&chat, Duration::from_secs(5));

        let first = generator.interpret("same dream", Tier::Standard).await.unwrap();
        let second = generator.interpret("same dream", Tier::Standard).await.unwrap();

        assert_ne!(first.text, second.text);
        assert_eq!(first.tier, second.tier);
        assert_eq!(first.model, second.model);
        assert_eq!(first.word_count, 3);
        assert_eq!(second.word_count, 7);
    }

    #[tokio::test]
    async fn test_blank_provider_text_fails() {
        let chat = MockChatClient::new().with_response("  \n ");

        let err = generator(&chat, Duration::from_secs(5))
            .interpret("a dream", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InterpretationFailed(_)));
    }

    #[tokio::test]
    async fn test_provider_error_is_interpretation_failed() {
        let chat = MockChatClient::new().with_failure("401 invalid key");

        let err = generator(&chat, Duration::from_secs(5))
            .interpret("a dream", Tier::Premium)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InterpretationFailed(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn test_deadline_is_interpretation_failed() {
        let chat = MockChatClient::new().with_delay(Duration::from_millis(500));

        let err = generator(&chat, Duration::from_millis(20))
            .interpret("a dream", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InterpretationFailed(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_within_deadline_completes() {
        use crate::ai::openai::OpenAiChatClient;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(400))
                    .set_body_json(serde_json::json!({
                        "choices": [{
                            "message": { "role": "assistant", "content": "Falling means letting go." },
                            "finish_reason": "stop"
                        }]
                    })),
            )
            .mount(&server)
            .await;

        let deadline = Duration::from_secs(2);
        let chat = OpenAiChatClient::new("key".to_string(), deadline).with_base_url(server.uri());
        let interpretation = InterpretationGenerator::new(Arc::new(chat), models(), deadline)
            .interpret("I kept falling", Tier::Standard)
            .await
            .unwrap();

        assert_eq!(interpretation.text, "Falling means letting go.");
    }

    #[tokio::test]
    async fn test_blank_dream_makes_no_provider_call() {
        let chat = MockChatClient::new();

        let err = generator(&chat, Duration::from_secs(5))
            .interpret("  ", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(chat.get_call_count(), 0);
    }
}
