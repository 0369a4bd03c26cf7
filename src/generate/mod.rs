//! Media generation stage
//!
//! Chooses model and parameters from the tier, submits the job, and
//! normalizes whatever shape the provider answers with into a
//! [`MediaArtifact`].

pub mod params;
pub mod probe;

pub use params::GenerationModels;
pub use probe::{first_url, UrlProbe, FAL_IMAGE_PROBES, FAL_VIDEO_PROBES};

use crate::ai::MediaGenerationService;
use crate::error::truncate_body;
use crate::models::{MediaArtifact, MediaKind, Tier};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct ArtifactGenerator {
    media: Arc<dyn MediaGenerationService>,
    models: GenerationModels,
    timeout: Duration,
}

impl ArtifactGenerator {
    pub fn new(
        media: Arc<dyn MediaGenerationService>,
        models: GenerationModels,
        timeout: Duration,
    ) -> Self {
        Self {
            media,
            models,
            timeout,
        }
    }

    pub fn models(&self) -> &GenerationModels {
        &self.models
    }

    pub async fn generate(&self, prompt: &str, tier: Tier) -> Result<MediaArtifact> {
        let prompt = validate_prompt(prompt)?;
        let model = self.models.image_model(tier).to_string();
        let input = serde_json::to_value(params::image_input(prompt, tier))?;
        self.submit(MediaKind::Image, &model, input, tier, FAL_IMAGE_PROBES)
            .await
    }

    pub async fn generate_video(&self, prompt: &str, tier: Tier) -> Result<MediaArtifact> {
        let prompt = validate_prompt(prompt)?;
        let model = self.models.video.clone();
        let input = serde_json::to_value(params::video_input(prompt, tier))?;
        self.submit(MediaKind::Video, &model, input, tier, FAL_VIDEO_PROBES)
            .await
    }

    async fn submit(
        &self,
        kind: MediaKind,
        model: &str,
        input: serde_json::Value,
        tier: Tier,
        probes: &[UrlProbe],
    ) -> Result<MediaArtifact> {
        tracing::info!("Generating {:?} with {} ({} tier)", kind, model, tier);

        let output = tokio::time::timeout(self.timeout, self.media.submit(model, input))
            .await
            .map_err(|_| {
                tracing::error!("{} timed out after {}s", model, self.timeout.as_secs());
                Error::GenerationFailed(format!(
                    "{} timed out after {}s",
                    model,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                tracing::error!("{} failed: {}", model, e);
                e.into_stage_failure(Error::GenerationFailed)
            })?;

        match first_url(probes, &output) {
            Some((label, url)) => {
                tracing::debug!("Found {:?} URL at {}", kind, label);
                Ok(MediaArtifact {
                    kind,
                    url: url.to_string(),
                    provider_model: model.to_string(),
                    tier,
                })
            }
            None => {
                let body = truncate_body(&output.to_string());
                tracing::error!("No {:?} URL in {} response: {}", kind, model, body);
                Err(Error::NoArtifactReturned(format!(
                    "{} returned no {:?} URL: {}",
                    model, kind, body
                )))
            }
        }
    }
}

fn validate_prompt(prompt: &str) -> Result<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(Error::Validation("prompt is required".to_string()));
    }
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockMediaGenerationClient;
    use serde_json::json;

    fn generator(mock: &MockMediaGenerationClient, timeout: Duration) -> ArtifactGenerator {
        ArtifactGenerator::new(Arc::new(mock.clone()), GenerationModels::default(), timeout)
    }

    #[tokio::test]
    async fn test_generate_standard_image() {
        let mock = MockMediaGenerationClient::new()
            .with_response(json!({ "images": [{ "url": "https://fal.media/a.png" }] }));

        let artifact = generator(&mock, Duration::from_secs(5))
            .generate("a glass city", Tier::Standard)
            .await
            .unwrap();

        assert_eq!(artifact.kind, MediaKind::Image);
        assert_eq!(artifact.url, "https://fal.media/a.png");
        assert_eq!(artifact.provider_model, "fal-ai/flux/schnell");

        let requests = mock.get_requests();
        assert_eq!(requests[0].1["image_size"], "square");
        assert_eq!(requests[0].1["num_inference_steps"], 4);
        assert_eq!(requests[0].1["prompt"], "a glass city");
    }

    #[tokio::test]
    async fn test_generate_premium_image_uses_premium_model() {
        let mock = MockMediaGenerationClient::new();

        let artifact = generator(&mock, Duration::from_secs(5))
            .generate("a glass city", Tier::Premium)
            .await
            .unwrap();

        assert_eq!(artifact.provider_model, "fal-ai/flux/dev");
        assert_eq!(artifact.tier, Tier::Premium);
        assert_eq!(mock.get_requests()[0].1["image_size"], "landscape_16_9");
    }

    #[tokio::test]
    async fn test_generate_video_reads_video_shape() {
        let mock = MockMediaGenerationClient::new()
            .with_response(json!({ "data": { "video": { "url": "https://fal.media/v.mp4" } } }));

        let artifact = generator(&mock, Duration::from_secs(5))
            .generate_video("falling upward", Tier::Premium)
            .await
            .unwrap();

        assert_eq!(artifact.kind, MediaKind::Video);
        assert_eq!(artifact.url, "https://fal.media/v.mp4");
        assert_eq!(mock.get_requests()[0].1["resolution"], "720p");
    }

    #[tokio::test]
    async fn test_shape_drift_is_no_artifact_returned() {
        let mock = MockMediaGenerationClient::new()
            .with_response(json!({ "result": "https://not-probed" }));

        let err = generator(&mock, Duration::from_secs(5))
            .generate("a dream", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoArtifactReturned(_)));
    }

    #[tokio::test]
    async fn test_empty_prompt_makes_no_provider_call() {
        let mock = MockMediaGenerationClient::new();

        let err = generator(&mock, Duration::from_secs(5))
            .generate("   ", Tier::Premium)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_generation_failed() {
        let mock = MockMediaGenerationClient::new().with_failure("fal 502");

        let err = generator(&mock, Duration::from_secs(5))
            .generate_video("a dream", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::GenerationFailed(ref m) if m.contains("fal 502")));
    }

    #[tokio::test]
    async fn test_deadline_is_generation_failed() {
        let mock = MockMediaGenerationClient::new().with_delay(Duration::from_millis(500));

        let err = generator(&mock, Duration::from_millis(20))
            .generate("a dream", Tier::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::GenerationFailed(ref m) if m.contains("timed out")));
    }
}
