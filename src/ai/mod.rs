//! AI provider integration
//!
//! Thin adapters over the external speech-to-text, media generation, and
//! language-model services. Each capability is a trait so the components in
//! `transcribe`, `generate`, and `interpret` can be handed real clients or
//! the mocks in [`mock`].

pub mod fal;
pub mod gemini;
pub mod mock;
pub mod openai;

pub use fal::{FalHttpClient, FalMediaClient, FalSpeechClient};
pub use gemini::GeminiChatClient;
pub use mock::{MockChatClient, MockMediaGenerationClient, MockSpeechToTextClient};
pub use openai::OpenAiChatClient;

use crate::models::TranscriptionResult;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Copy audio into provider-side storage, returning a URL the provider
    /// can read.
    async fn upload_audio(&self, data: Vec<u8>, content_type: &str, file_name: &str)
        -> Result<String>;

    async fn transcribe(&self, audio_url: &str) -> Result<TranscriptionResult>;
}

#[async_trait]
pub trait MediaGenerationService: Send + Sync {
    /// Run a generation job and return the provider's raw response.
    ///
    /// Response shapes vary by model and API version, so normalization is left
    /// to the caller.
    async fn submit(&self, model: &str, input: serde_json::Value) -> Result<serde_json::Value>;
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatPrompt {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;
}
