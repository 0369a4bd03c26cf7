//! Tier policy: which model and parameters each tier gets.

use crate::ai::fal::types::{FluxInput, PixverseInput};
use crate::models::Tier;

pub const VIDEO_DURATION_SECS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationModels {
    pub image_standard: String,
    pub image_premium: String,
    pub video: String,
}

impl Default for GenerationModels {
    fn default() -> Self {
        Self {
            image_standard: "fal-ai/flux/schnell".to_string(),
            image_premium: "fal-ai/flux/dev".to_string(),
            video: "fal-ai/pixverse/v5/text-to-video".to_string(),
        }
    }
}

impl GenerationModels {
    pub fn image_model(&self, tier: Tier) -> &str {
        match tier {
            Tier::Standard => &self.image_standard,
            Tier::Premium => &self.image_premium,
        }
    }
}

pub fn image_input(prompt: &str, tier: Tier) -> FluxInput {
    let (image_size, num_inference_steps) = match tier {
        Tier::Standard => ("square", 4),
        Tier::Premium => ("landscape_16_9", 28),
    };
    FluxInput {
        prompt: prompt.to_string(),
        image_size: image_size.to_string(),
        num_inference_steps,
        num_images: 1,
    }
}

pub fn video_input(prompt: &str, tier: Tier) -> PixverseInput {
    let resolution = match tier {
        Tier::Standard => "540p",
        Tier::Premium => "720p",
    };
    PixverseInput {
        prompt: prompt.to_string(),
        duration: VIDEO_DURATION_SECS,
        resolution: resolution.to_string(),
    }
}
