//! fal.ai request/response payloads.

use serde::{Deserialize, Serialize};

/// Input for `fal-ai/whisper`.
#[derive(Debug, Serialize)]
pub struct WhisperInput<'a> {
    pub audio_url: &'a str,
    pub task: &'static str,
    /// `None` lets whisper detect the language.
    pub language: Option<&'a str>,
    pub chunk_level: &'static str,
    pub version: &'static str,
}

impl<'a> WhisperInput<'a> {
    pub fn transcribe(audio_url: &'a str) -> Self {
        Self {
            audio_url,
            task: "transcribe",
            language: None,
            chunk_level: "segment",
            version: "3",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WhisperOutput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub chunks: Vec<WhisperChunk>,
}

/// One whisper chunk. `timestamp` is `[start, end]`; `end` is null for a
/// chunk cut off at the end of the audio.
#[derive(Debug, Deserialize)]
pub struct WhisperChunk {
    #[serde(default)]
    pub timestamp: Vec<Option<f64>>,
    #[serde(default)]
    pub text: String,
}

/// Input for the flux text-to-image models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxInput {
    pub prompt: String,
    pub image_size: String,
    pub num_inference_steps: u32,
    pub num_images: u32,
}

/// Input for the pixverse text-to-video model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixverseInput {
    pub prompt: String,
    pub duration: u32,
    pub resolution: String,
}

#[derive(Debug, Serialize)]
pub struct InitiateUploadRequest<'a> {
    pub content_type: &'a str,
    pub file_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct InitiateUploadResponse {
    pub upload_url: String,
    pub file_url: String,
}
