use super::client::FalHttpClient;
use super::types::{WhisperInput, WhisperOutput};
use crate::ai::SpeechToTextService;
use crate::models::{Segment, TranscriptionResult};
use crate::{Error, Result};
use async_trait::async_trait;

/// Whisper speech-to-text on fal.ai, with fal storage for re-uploads.
pub struct FalSpeechClient {
    http: FalHttpClient,
    model: String,
}

impl FalSpeechClient {
    pub fn new(http: FalHttpClient, model: String) -> Self {
        Self { http, model }
    }

    fn normalize(raw: serde_json::Value) -> Result<TranscriptionResult> {
        let output: WhisperOutput = serde_json::from_value(raw.clone()).map_err(|e| {
            Error::UpstreamUnavailable(format!("Unexpected whisper output shape: {}", e))
        })?;

        let segments = output
            .chunks
            .into_iter()
            .filter_map(|chunk| {
                let start = chunk.timestamp.first().copied().flatten()?;
                let end = chunk.timestamp.get(1).copied().flatten();
                Some(Segment {
                    start,
                    end,
                    text: chunk.text.trim().to_string(),
                })
            })
            .collect();

        Ok(TranscriptionResult {
            text: output.text.trim().to_string(),
            segments,
            raw: Some(raw),
        })
    }
}

#[async_trait]
impl SpeechToTextService for FalSpeechClient {
    async fn upload_audio(
        &self,
        data: Vec<u8>,
        content_type: &str,
        file_name: &str,
    ) -> Result<String> {
        self.http.upload(data, content_type, file_name).await
    }

    async fn transcribe(&self, audio_url: &str) -> Result<TranscriptionResult> {
        tracing::info!("Requesting transcription from {} for {}", self.model, audio_url);
        let raw = self
            .http
            .run(&self.model, &WhisperInput::transcribe(audio_url))
            .await?;
        Self::normalize(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> FalSpeechClient {
        FalSpeechClient::new(
            FalHttpClient::new("k".to_string(), Duration::from_secs(5)).with_base_url(server.uri()),
            "fal-ai/whisper".to_string(),
        )
    }

    #[tokio::test]
    async fn test_transcribe_sends_whisper_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/whisper"))
            .and(body_partial_json(serde_json::json!({
                "audio_url": "https://v3.fal.media/a.m4a",
                "task": "transcribe",
                "language": null,
                "chunk_level": "segment",
                "version": "3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "text": " I was flying over a city. ",
                "chunks": [
                    { "timestamp": [0.0, 2.5], "text": " I was flying" },
                    { "timestamp": [2.5, null], "text": " over a city." }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = make_client(&server)
            .transcribe("https://v3.fal.media/a.m4a")
            .await
            .unwrap();

        assert_eq!(result.text, "I was flying over a city.");
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[0].end, Some(2.5));
        assert_eq!(result.segments[1].end, None);
        assert_eq!(result.segments[1].text, "over a city.");
        assert!(result.raw.is_some());
    }

    #[tokio::test]
    async fn test_transcribe_without_chunks() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/whisper"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "hello" })),
            )
            .mount(&server)
            .await;

        let result = make_client(&server).transcribe("https://x/a.m4a").await.unwrap();
        assert_eq!(result.text, "hello");
        assert!(result.segments.is_empty());
    }
}
