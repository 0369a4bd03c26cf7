//! Data models and structures
//!
//! Defines the dream request, the per-stage results, and the aggregate
//! [`DreamResult`] the pipeline hands back to callers.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Quality/cost level selecting provider parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Standard,
    Premium,
}

impl Tier {
    pub fn from_premium(is_premium: bool) -> Self {
        if is_premium {
            Tier::Premium
        } else {
            Tier::Standard
        }
    }

    pub fn is_premium(self) -> bool {
        matches!(self, Tier::Premium)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Standard => write!(f, "standard"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub media: MediaKind,
}

impl DreamRequest {
    pub fn from_text(text: impl Into<String>, tier: Tier) -> Self {
        Self {
            source_text: Some(text.into()),
            tier,
            ..Self::default()
        }
    }

    pub fn from_audio(audio_url: impl Into<String>, tier: Tier) -> Self {
        Self {
            audio_ref: Some(audio_url.into()),
            tier,
            ..Self::default()
        }
    }

    pub fn with_media(mut self, media: MediaKind) -> Self {
        self.media = media;
        self
    }

    /// Non-blank source text, if any.
    pub fn text(&self) -> Option<&str> {
        self.source_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Non-blank audio reference, if any.
    pub fn audio(&self) -> Option<&str> {
        self.audio_ref
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// One timed span of a transcript. The final span may be open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: Option<f64>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Untouched provider payload, kept for diagnostics.
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaArtifact {
    pub kind: MediaKind,
    pub url: String,
    pub provider_model: String,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub text: String,
    pub tier: Tier,
    pub word_count: usize,
    pub model: String,
}

impl Interpretation {
    pub fn new(text: String, tier: Tier, model: String) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            text,
            tier,
            word_count,
            model,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Transcription,
    Generation,
    Interpretation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Transcription => write!(f, "transcription"),
            Stage::Generation => write!(f, "generation"),
            Stage::Interpretation => write!(f, "interpretation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&crate::Error> for StageError {
    fn from(err: &crate::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Created,
    TranscribingOptional,
    Generating,
    Interpreting,
    Completed,
    PartiallyFailed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::PartiallyFailed)
    }
}

/// Aggregate root for one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamResult {
    pub id: Uuid,
    pub request: DreamRequest,
    pub state: PipelineState,
    /// Text the generation stages ran on, after transcription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<TranscriptionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<MediaArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<Interpretation>,
    #[serde(default)]
    pub stage_errors: BTreeMap<Stage, StageError>,
}

impl DreamResult {
    pub fn new(request: DreamRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            state: PipelineState::Created,
            source_text: None,
            transcription: None,
            artifact: None,
            interpretation: None,
            stage_errors: BTreeMap::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == PipelineState::Completed
    }

    pub fn error_for(&self, stage: Stage) -> Option<&StageError> {
        self.stage_errors.get(&stage)
    }
}
