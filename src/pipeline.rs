//! Dream pipeline orchestration
//!
//! Drives one [`DreamRequest`] through optional transcription, then runs
//! media generation and interpretation concurrently and folds both outcomes
//! into a [`DreamResult`]. Stage failures are recorded on the result rather
//! than aborting the invocation.

use crate::ai::{
    ChatService, FalHttpClient, FalMediaClient, FalSpeechClient, GeminiChatClient,
    MediaGenerationService, MockChatClient, MockMediaGenerationClient, MockSpeechToTextClient,
    OpenAiChatClient, SpeechToTextService,
};
use crate::config::{ChatProvider, Config, StageTimeouts};
use crate::generate::{ArtifactGenerator, GenerationModels};
use crate::interpret::{InterpretationGenerator, InterpretationModels};
use crate::models::{
    DreamRequest, DreamResult, MediaArtifact, MediaKind, PipelineState, Stage, StageError, Tier,
};
use crate::prompts;
use crate::storage::MediaStorage;
use crate::transcribe::Transcriber;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Injectable provider bundle used to construct [`DreamPipeline`].
pub struct PipelineServices {
    pub stt: Arc<dyn SpeechToTextService>,
    pub media: Arc<dyn MediaGenerationService>,
    pub chat: Arc<dyn ChatService>,
    pub storage: Arc<dyn MediaStorage>,
}

impl PipelineServices {
    /// Real provider clients, or the mock family when `DRY_RUN` is set.
    pub fn from_config(config: &Config, storage: Arc<dyn MediaStorage>) -> Result<Self> {
        if config.dry_run {
            info!("DRY RUN: using mock speech, media, and chat providers");
            return Ok(Self::mock(storage));
        }

        let fal_key = config
            .fal_key
            .clone()
            .ok_or_else(|| Error::Config("FAL_KEY not set".to_string()))?;
        let chat_key = config
            .chat_api_key()
            .map(str::to_string)
            .ok_or_else(|| Error::Config("Interpretation API key not set".to_string()))?;

        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let fal = |timeout: std::time::Duration| {
            let mut client =
                FalHttpClient::new_with_client(fal_key.clone(), timeout, http_client.clone());
            if let Some(url) = &config.fal_base_url {
                client = client.with_base_url(url.clone());
            }
            if let Some(url) = &config.fal_storage_url {
                client = client.with_storage_url(url.clone());
            }
            client
        };

        info!("Speech-to-text provider: fal.ai (model: {})", config.stt_model);
        let stt = FalSpeechClient::new(
            fal(config.timeouts.transcription),
            config.stt_model.clone(),
        );
        let media = FalMediaClient::new(fal(config.timeouts.generation));

        let chat: Arc<dyn ChatService> = match config.chat_provider {
            ChatProvider::OpenAi => {
                info!(
                    "Interpretation provider: OpenAI (models: {} / {})",
                    config.interpret_model_standard, config.interpret_model_premium
                );
                Arc::new(OpenAiChatClient::new_with_client(
                    chat_key,
                    config.timeouts.interpretation,
                    http_client.clone(),
                ))
            }
            ChatProvider::Gemini => {
                info!(
                    "Interpretation provider: Gemini (models: {} / {})",
                    config.interpret_model_standard, config.interpret_model_premium
                );
                Arc::new(GeminiChatClient::new_with_client(
                    chat_key,
                    config.timeouts.interpretation,
                    http_client.clone(),
                ))
            }
        };

        Ok(Self {
            stt: Arc::new(stt),
            media: Arc::new(media),
            chat,
            storage,
        })
    }

    pub fn mock(storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            stt: Arc::new(MockSpeechToTextClient::new()),
            media: Arc::new(MockMediaGenerationClient::new()),
            chat: Arc::new(MockChatClient::new()),
            storage,
        }
    }
}

/// Models, deadlines, and tier rules for the pipeline components.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub generation_models: GenerationModels,
    pub interpretation_models: InterpretationModels,
    pub timeouts: StageTimeouts,
    pub enforce_premium_video: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generation_models: GenerationModels {
                image_standard: config.image_model_standard.clone(),
                image_premium: config.image_model_premium.clone(),
                video: config.video_model.clone(),
            },
            interpretation_models: InterpretationModels {
                standard: config.interpret_model_standard.clone(),
                premium: config.interpret_model_premium.clone(),
            },
            timeouts: config.timeouts,
            enforce_premium_video: config.enforce_premium_video,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            generation_models: GenerationModels::default(),
            interpretation_models: InterpretationModels {
                standard: "gpt-4o-mini".to_string(),
                premium: "gpt-4o".to_string(),
            },
            timeouts: StageTimeouts::default(),
            enforce_premium_video: false,
        }
    }
}

pub struct DreamPipeline {
    transcriber: Transcriber,
    generator: ArtifactGenerator,
    interpreter: InterpretationGenerator,
    storage: Arc<dyn MediaStorage>,
    enforce_premium_video: bool,
}

impl DreamPipeline {
    pub fn with_services(services: PipelineServices, settings: PipelineSettings) -> Self {
        Self {
            transcriber: Transcriber::new(
                services.stt,
                services.storage.clone(),
                settings.timeouts.transcription,
            ),
            generator: ArtifactGenerator::new(
                services.media,
                settings.generation_models,
                settings.timeouts.generation,
            ),
            interpreter: InterpretationGenerator::new(
                services.chat,
                settings.interpretation_models,
                settings.timeouts.interpretation,
            ),
            storage: services.storage,
            enforce_premium_video: settings.enforce_premium_video,
        }
    }

    pub fn transcriber(&self) -> &Transcriber {
        &self.transcriber
    }

    pub fn generator(&self) -> &ArtifactGenerator {
        &self.generator
    }

    pub fn interpreter(&self) -> &InterpretationGenerator {
        &self.interpreter
    }

    pub fn storage(&self) -> &Arc<dyn MediaStorage> {
        &self.storage
    }

    /// Reject standard-tier video when the premium gate is switched on.
    pub fn check_video_tier(&self, tier: Tier) -> Result<()> {
        if self.enforce_premium_video && !tier.is_premium() {
            return Err(Error::Validation(
                "Video generation requires the premium tier".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn run(&self, request: DreamRequest) -> Result<DreamResult> {
        if request.text().is_none() && request.audio().is_none() {
            return Err(Error::Validation(
                "dreamText or audioUrl is required".to_string(),
            ));
        }
        if request.media == MediaKind::Video {
            self.check_video_tier(request.tier)?;
        }

        let mut result = DreamResult::new(request.clone());
        info!(
            "Dream {} started ({} tier, {:?})",
            result.id, request.tier, request.media
        );

        let mut text = request.text().map(str::to_string);

        if let Some(audio_url) = request.audio() {
            transition(&mut result, PipelineState::TranscribingOptional);
            match self.transcriber.transcribe(audio_url).await {
                Ok(transcription) => {
                    let transcript = transcription.text.trim();
                    text = Some(match text {
                        Some(typed) => format!("{}\n\n{}", typed, transcript),
                        None => transcript.to_string(),
                    });
                    result.transcription = Some(transcription);
                }
                Err(e) => {
                    record(&mut result, Stage::Transcription, &e);
                    transition(&mut result, PipelineState::PartiallyFailed);
                    return Ok(result);
                }
            }
        }

        let text = text.ok_or_else(|| {
            Error::Invariant("no dream text after transcription".to_string())
        })?;
        result.source_text = Some(text.clone());

        transition(&mut result, PipelineState::Generating);
        let prompt = prompts::visualization(&text);
        let tier = request.tier;

        let (generated, interpreted) = tokio::join!(
            self.visualize(&prompt, tier, request.media),
            self.interpreter.interpret(&text, tier)
        );

        match generated {
            Ok(artifact) => result.artifact = Some(artifact),
            Err(e) => record(&mut result, Stage::Generation, &e),
        }

        transition(&mut result, PipelineState::Interpreting);
        match interpreted {
            Ok(interpretation) => result.interpretation = Some(interpretation),
            Err(e) => record(&mut result, Stage::Interpretation, &e),
        }

        let terminal = if result.artifact.is_some() {
            PipelineState::Completed
        } else {
            PipelineState::PartiallyFailed
        };
        transition(&mut result, terminal);

        Ok(result)
    }

    /// Produce a fresh artifact for an earlier result. The earlier result is
    /// left untouched.
    pub async fn regenerate(&self, previous: &DreamResult) -> Result<MediaArtifact> {
        let text = previous
            .source_text
            .as_deref()
            .or_else(|| previous.request.text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Validation("Result has no dream text to regenerate from".to_string()))?;

        let media = previous.request.media;
        if media == MediaKind::Video {
            self.check_video_tier(previous.request.tier)?;
        }

        info!("Regenerating {:?} for dream {}", media, previous.id);
        self.visualize(&prompts::visualization(text), previous.request.tier, media)
            .await
    }

    async fn visualize(&self, prompt: &str, tier: Tier, media: MediaKind) -> Result<MediaArtifact> {
        match media {
            MediaKind::Image => self.generator.generate(prompt, tier).await,
            MediaKind::Video => self.generator.generate_video(prompt, tier).await,
        }
    }
}

fn transition(result: &mut DreamResult, next: PipelineState) {
    info!("Dream {}: {:?} -> {:?}", result.id, result.state, next);
    result.state = next;
}

fn record(result: &mut DreamResult, stage: Stage, error: &Error) {
    warn!("Dream {}: {} stage failed: {}", result.id, stage, error);
    result.stage_errors.insert(stage, StageError::from(error));
}
