//! Speech-to-text stage
//!
//! Turns an audio URL into a [`TranscriptionResult`]. Audio that lives in
//! this service's own storage is not reachable by the provider, so it is read
//! back and re-uploaded to provider storage first.

use crate::ai::SpeechToTextService;
use crate::models::TranscriptionResult;
use crate::storage::mime::resolve_audio_mime;
use crate::storage::MediaStorage;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct Transcriber {
    stt: Arc<dyn SpeechToTextService>,
    storage: Arc<dyn MediaStorage>,
    timeout: Duration,
}

impl Transcriber {
    pub fn new(
        stt: Arc<dyn SpeechToTextService>,
        storage: Arc<dyn MediaStorage>,
        timeout: Duration,
    ) -> Self {
        Self {
            stt,
            storage,
            timeout,
        }
    }

    pub async fn transcribe(&self, audio_url: &str) -> Result<TranscriptionResult> {
        let audio_url = audio_url.trim();
        if audio_url.is_empty() {
            return Err(Error::Validation("audio_url is required".to_string()));
        }

        // Resolved before the deadline starts: a missing local file must fail
        // without touching the provider.
        let local = self.storage.fetch_local(audio_url).await?;

        let work = async {
            let provider_url = match local {
                Some(media) => {
                    let content_type = resolve_audio_mime(&media.data, &media.file_name);
                    tracing::info!(
                        "Re-uploading local audio {} ({} bytes, {}) to provider storage",
                        media.file_name,
                        media.data.len(),
                        content_type
                    );
                    self.stt
                        .upload_audio(media.data, content_type, &media.file_name)
                        .await?
                }
                None => audio_url.to_string(),
            };
            self.stt.transcribe(&provider_url).await
        };

        let result = tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| {
                tracing::error!(
                    "Transcription of {} timed out after {}s",
                    audio_url,
                    self.timeout.as_secs()
                );
                Error::TranscriptionFailed(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                tracing::error!("Transcription of {} failed: {}", audio_url, e);
                e.into_stage_failure(Error::TranscriptionFailed)
            })?;

        if result.text.trim().is_empty() {
            return Err(Error::TranscriptionFailed(
                "provider returned an empty transcript".to_string(),
            ));
        }

        tracing::info!(
            "Transcribed {} ({} chars, {} segments)",
            audio_url,
            result.text.len(),
            result.segments.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockSpeechToTextClient;
    use crate::storage::MockMediaStorage;

    fn transcriber(
        stt: &MockSpeechToTextClient,
        storage: &MockMediaStorage,
        timeout: Duration,
    ) -> Transcriber {
        Transcriber::new(Arc::new(stt.clone()), Arc::new(storage.clone()), timeout)
    }

    #[tokio::test]
    async fn test_remote_url_goes_straight_to_provider() {
        let stt = MockSpeechToTextClient::new().with_transcript("a red door");
        let storage = MockMediaStorage::new();

        let result = transcriber(&stt, &storage, Duration::from_secs(5))
            .transcribe("https://cdn.example.com/rec.m4a")
            .await
            .unwrap();

        assert_eq!(result.text, "a red door");
        assert_eq!(stt.get_upload_count(), 0);
        assert_eq!(
            stt.get_transcribed_urls(),
            vec!["https://cdn.example.com/rec.m4a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_local_audio_is_reuploaded_with_sniffed_type() {
        let stt = MockSpeechToTextClient::new();
        let storage =
            MockMediaStorage::new().with_file("rec_1.m4a".to_string(), b"ID3\x04rest".to_vec());

        transcriber(&stt, &storage, Duration::from_secs(5))
            .transcribe(&storage.url_for("rec_1.m4a"))
            .await
            .unwrap();

        assert_eq!(stt.get_upload_count(), 1);
        assert_eq!(stt.get_uploaded_content_types(), vec!["audio/mpeg".to_string()]);
        assert_eq!(
            stt.get_transcribed_urls(),
            vec!["https://fal.media/files/mock/rec_1.m4a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_local_file_makes_no_provider_call() {
        let stt = MockSpeechToTextClient::new();
        let storage = MockMediaStorage::new();

        let err = transcriber(&stt, &storage, Duration::from_secs(5))
            .transcribe(&storage.url_for("gone.m4a"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert_eq!(stt.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_fails() {
        let stt = MockSpeechToTextClient::new().with_transcript("   ");
        let storage = MockMediaStorage::new();

        let err = transcriber(&stt, &storage, Duration::from_secs(5))
            .transcribe("https://cdn.example.com/silence.wav")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TranscriptionFailed(_)));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_transcription_failed() {
        let stt = MockSpeechToTextClient::new().with_failure("503 from whisper");
        let storage = MockMediaStorage::new();

        let err = transcriber(&stt, &storage, Duration::from_secs(5))
            .transcribe("https://cdn.example.com/a.wav")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TranscriptionFailed(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_deadline_becomes_transcription_failed() {
        let stt = MockSpeechToTextClient::new().with_delay(Duration::from_millis(500));
        let storage = MockMediaStorage::new();

        let err = transcriber(&stt, &storage, Duration::from_millis(20))
            .transcribe("https://cdn.example.com/a.wav")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TranscriptionFailed(ref m) if m.contains("timed out")));
    }
}
