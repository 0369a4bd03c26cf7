//! In-memory provider doubles for tests and `DRY_RUN` mode.

use super::{ChatPrompt, ChatService, MediaGenerationService, SpeechToTextService};
use crate::models::{Segment, TranscriptionResult};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_TRANSCRIPT: &str = "I was flying over a city made of glass and nobody could see me.";
const DEFAULT_INTERPRETATION: &str = "Flying over a glass city points to a wish for freedom \
     and perspective, while feeling unseen hints that you are keeping part of yourself hidden \
     from the people around you.";

/// Pick the next canned response, cycling once the list is exhausted.
fn next_response<T: Clone>(responses: &[T], call: usize) -> Option<T> {
    if responses.is_empty() {
        None
    } else {
        Some(responses[(call - 1) % responses.len()].clone())
    }
}

async fn simulate(delay: Option<Duration>, failure: Option<String>) -> Result<()> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match failure {
        Some(message) => Err(Error::UpstreamUnavailable(message)),
        None => Ok(()),
    }
}

#[derive(Clone, Default)]
pub struct MockSpeechToTextClient {
    transcripts: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
    transcribe_count: Arc<Mutex<usize>>,
    upload_count: Arc<Mutex<usize>>,
    transcribed_urls: Arc<Mutex<Vec<String>>>,
    uploaded_content_types: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechToTextClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(self, text: &str) -> Self {
        self.transcripts.lock().unwrap().push(text.to_string());
        self
    }

    /// Every call fails with `UpstreamUnavailable(message)`.
    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_transcribe_count(&self) -> usize {
        *self.transcribe_count.lock().unwrap()
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    /// Total provider calls of any kind.
    pub fn get_call_count(&self) -> usize {
        self.get_transcribe_count() + self.get_upload_count()
    }

    pub fn get_transcribed_urls(&self) -> Vec<String> {
        self.transcribed_urls.lock().unwrap().clone()
    }

    pub fn get_uploaded_content_types(&self) -> Vec<String> {
        self.uploaded_content_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechToTextService for MockSpeechToTextClient {
    async fn upload_audio(
        &self,
        _data: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<String> {
        *self.upload_count.lock().unwrap() += 1;
        self.uploaded_content_types
            .lock()
            .unwrap()
            .push(content_type.to_string());

        let failure = self.failure.lock().unwrap().clone();
        simulate(self.delay, failure).await?;

        Ok(format!("https://fal.media/files/mock/{}", file_name))
    }

    async fn transcribe(&self, audio_url: &str) -> Result<TranscriptionResult> {
        let call = {
            let mut count = self.transcribe_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.transcribed_urls
            .lock()
            .unwrap()
            .push(audio_url.to_string());

        let failure = self.failure.lock().unwrap().clone();
        simulate(self.delay, failure).await?;

        let text = next_response(self.transcripts.lock().unwrap().as_slice(), call)
            .unwrap_or_else(|| DEFAULT_TRANSCRIPT.to_string());
        let segments = if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Segment {
                start: 0.0,
                end: None,
                text: text.clone(),
            }]
        };

        Ok(TranscriptionResult {
            raw: Some(serde_json::json!({ "text": text })),
            text,
            segments,
        })
    }
}

#[derive(Clone, Default)]
pub struct MockMediaGenerationClient {
    responses: Arc<Mutex<Vec<serde_json::Value>>>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
    call_count: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockMediaGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw provider response; responses cycle once exhausted.
    pub fn with_response(self, response: serde_json::Value) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// `(model, input)` for every submitted job, in call order.
    pub fn get_requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }

    fn default_response(model: &str, call: usize) -> serde_json::Value {
        if model.contains("video") {
            serde_json::json!({
                "video": { "url": format!("https://fal.media/files/mock/video_{}.mp4", call) }
            })
        } else {
            serde_json::json!({
                "images": [{ "url": format!("https://fal.media/files/mock/image_{}.png", call) }]
            })
        }
    }
}

#[async_trait]
impl MediaGenerationService for MockMediaGenerationClient {
    async fn submit(&self, model: &str, input: serde_json::Value) -> Result<serde_json::Value> {
        let call = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), input));

        let failure = self.failure.lock().unwrap().clone();
        simulate(self.delay, failure).await?;

        Ok(next_response(self.responses.lock().unwrap().as_slice(), call)
            .unwrap_or_else(|| Self::default_response(model, call)))
    }
}

#[derive(Clone, Default)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<ChatPrompt>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, response: &str) -> Self {
        self.responses.lock().unwrap().push(response.to_string());
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let call = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.clone());

        let failure = self.failure.lock().unwrap().clone();
        simulate(self.delay, failure).await?;

        Ok(next_response(self.responses.lock().unwrap().as_slice(), call)
            .unwrap_or_else(|| DEFAULT_INTERPRETATION.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_media_mock_default_shapes_follow_model() {
        let mock = MockMediaGenerationClient::new();

        let image = mock
            .submit("fal-ai/flux/schnell", serde_json::json!({}))
            .await
            .unwrap();
        assert!(image["images"][0]["url"].is_string());

        let video = mock
            .submit("fal-ai/pixverse/v5/text-to-video", serde_json::json!({}))
            .await
            .unwrap();
        assert!(video["video"]["url"].is_string());

        assert_eq!(mock.get_call_count(), 2);
        assert_eq!(mock.get_requests()[1].0, "fal-ai/pixverse/v5/text-to-video");
    }

    #[tokio::test]
    async fn test_chat_mock_cycles_responses() {
        let mock = MockChatClient::new()
            .with_response("first")
            .with_response("second");
        let prompt = ChatPrompt {
            model: "m".to_string(),
            system: "s".to_string(),
            user: "u".to_string(),
            max_tokens: 10,
        };

        assert_eq!(mock.complete(&prompt).await.unwrap(), "first");
        assert_eq!(mock.complete(&prompt).await.unwrap(), "second");
        assert_eq!(mock.complete(&prompt).await.unwrap(), "first");
        assert_eq!(mock.get_prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_counted_and_reported_upstream() {
        let mock = MockSpeechToTextClient::new().with_failure("whisper down");

        let err = mock.transcribe("https://cdn/a.m4a").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(ref m) if m == "whisper down"));
        assert_eq!(mock.get_transcribe_count(), 1);
    }
}
