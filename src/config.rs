//! Runtime configuration loaded from the environment (and `.env`).

use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatProvider {
    OpenAi,
    Gemini,
}

impl FromStr for ChatProvider {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ChatProvider::OpenAi),
            "gemini" => Ok(ChatProvider::Gemini),
            other => Err(Error::Config(format!(
                "Unknown INTERPRET_PROVIDER '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }
}

impl ChatProvider {
    fn default_models(self) -> (&'static str, &'static str) {
        match self {
            ChatProvider::OpenAi => ("gpt-4o-mini", "gpt-4o"),
            ChatProvider::Gemini => ("gemini-2.5-flash-lite", "gemini-2.5-flash"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            other => Err(Error::Config(format!(
                "Unknown STORAGE_BACKEND '{}'. Expected 'local' or 's3'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CdnConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub bucket: String,
    pub base_url: String,
}

/// Per-stage provider deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub transcription: Duration,
    pub generation: Duration,
    pub interpretation: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            transcription: Duration::from_secs(120),
            generation: Duration::from_secs(300),
            interpretation: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub public_base_url: String,
    pub development: bool,
    pub dry_run: bool,

    pub fal_key: Option<String>,
    pub fal_base_url: Option<String>,
    pub fal_storage_url: Option<String>,
    pub stt_model: String,
    pub image_model_standard: String,
    pub image_model_premium: String,
    pub video_model: String,

    pub chat_provider: ChatProvider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub interpret_model_standard: String,
    pub interpret_model_premium: String,

    pub storage_backend: StorageBackend,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub cdn: Option<CdnConfig>,

    pub timeouts: StageTimeouts,
    pub enforce_premium_video: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&var, "PORT", DEFAULT_PORT)?;
        let dry_run = parse_bool(&var, "DRY_RUN")?;
        let public_base_url = var("PUBLIC_BASE_URL")
            .or_else(|| var("NGROK_URL"))
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let chat_provider: ChatProvider = match var("INTERPRET_PROVIDER") {
            Some(v) => v.parse()?,
            None => ChatProvider::OpenAi,
        };
        let (default_standard, default_premium) = chat_provider.default_models();

        let storage_backend: StorageBackend = match var("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => StorageBackend::Local,
        };

        let defaults = StageTimeouts::default();
        let timeouts = StageTimeouts {
            transcription: parse_secs(&var, "TRANSCRIPTION_TIMEOUT_SECS", defaults.transcription)?,
            generation: parse_secs(&var, "GENERATION_TIMEOUT_SECS", defaults.generation)?,
            interpretation: parse_secs(
                &var,
                "INTERPRETATION_TIMEOUT_SECS",
                defaults.interpretation,
            )?,
        };

        let config = Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            public_base_url,
            development: var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            dry_run,

            fal_key: var("FAL_KEY"),
            fal_base_url: var("FAL_BASE_URL"),
            fal_storage_url: var("FAL_STORAGE_URL"),
            stt_model: var("STT_MODEL").unwrap_or_else(|| "fal-ai/whisper".to_string()),
            image_model_standard: var("IMAGE_MODEL_STANDARD")
                .unwrap_or_else(|| "fal-ai/flux/schnell".to_string()),
            image_model_premium: var("IMAGE_MODEL_PREMIUM")
                .unwrap_or_else(|| "fal-ai/flux/dev".to_string()),
            video_model: var("VIDEO_MODEL")
                .unwrap_or_else(|| "fal-ai/pixverse/v5/text-to-video".to_string()),

            chat_provider,
            openai_api_key: var("OPENAI_API_KEY"),
            gemini_api_key: var("GEMINI_API_KEY"),
            interpret_model_standard: var("INTERPRET_MODEL_STANDARD")
                .unwrap_or_else(|| default_standard.to_string()),
            interpret_model_premium: var("INTERPRET_MODEL_PREMIUM")
                .unwrap_or_else(|| default_premium.to_string()),

            storage_backend,
            upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cdn: Self::cdn_from(&var, storage_backend)?,

            timeouts,
            enforce_premium_video: parse_bool(&var, "ENFORCE_PREMIUM_VIDEO")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn cdn_from<F>(var: &F, backend: StorageBackend) -> Result<Option<CdnConfig>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if backend != StorageBackend::S3 {
            return Ok(None);
        }
        let required = |key: &str| {
            var(key).ok_or_else(|| Error::Config(format!("{} not set (STORAGE_BACKEND=s3)", key)))
        };
        Ok(Some(CdnConfig {
            access_key_id: required("CDN_ACCESS_KEY_ID")?,
            secret_access_key: required("CDN_SECRET_ACCESS_KEY")?,
            endpoint: var("CDN_ENDPOINT")
                .unwrap_or_else(|| "https://nyc3.digitaloceanspaces.com".to_string()),
            bucket: required("CDN_BUCKET")?,
            base_url: required("CDN_BASE_URL")?.trim_end_matches('/').to_string(),
        }))
    }

    fn validate(&self) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        if self.fal_key.is_none() {
            return Err(Error::Config("FAL_KEY not set".to_string()));
        }
        match self.chat_provider {
            ChatProvider::OpenAi if self.openai_api_key.is_none() => Err(Error::Config(
                "OPENAI_API_KEY not set (INTERPRET_PROVIDER=openai)".to_string(),
            )),
            ChatProvider::Gemini if self.gemini_api_key.is_none() => Err(Error::Config(
                "GEMINI_API_KEY not set (INTERPRET_PROVIDER=gemini)".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn chat_api_key(&self) -> Option<&str> {
        match self.chat_provider {
            ChatProvider::OpenAi => self.openai_api_key.as_deref(),
            ChatProvider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}

fn parse_secs<F>(var: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(var, key, default.as_secs())?;
    if secs == 0 {
        return Err(Error::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool<F>(var: &F, key: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(Error::Config(format!("Invalid boolean for {}: '{}'", key, v))),
    }
}
