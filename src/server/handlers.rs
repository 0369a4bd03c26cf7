use super::{ApiError, AppState};
use crate::models::{DreamRequest, MediaKind, Tier};
use crate::Error;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

type ApiResult<T> = std::result::Result<T, ApiError>;

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, format!("{} is required", field)))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let settings = &state.settings;
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "env": {
            "mode": if settings.development { "development" } else { "production" },
            "dryRun": settings.dry_run,
            "falKey": if settings.fal_configured { "set" } else { "missing" },
            "interpretProvider": settings.interpret_provider,
            "publicBaseUrl": settings.public_base_url,
            "maxUploadBytes": settings.max_upload_bytes,
        },
        "endpoints": {
            "upload": "POST /api/upload",
            "stt": "POST /api/stt",
            "generateImage": "POST /api/generate-image",
            "generateVideo": "POST /api/generate-video",
            "analyzeDream": "POST /api/analyze-dream",
            "dreams": "POST /api/dreams",
            "test": "GET /api/test?url=YOUR_URL",
        },
    }))
}

fn multipart_error(err: MultipartError, headers: &HeaderMap, limit: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(limit.saturating_add(1));
        return ApiError::from_error(
            "Upload rejected",
            Error::PayloadTooLarge { size, limit },
            false,
        );
    }
    ApiError::new(
        StatusCode::BAD_REQUEST,
        format!("Malformed multipart body: {}", err.body_text()),
    )
}

pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let limit = state.settings.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &headers, limit))?
    {
        if field.name() != Some("audio") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &headers, limit))?;

        let stored = state
            .pipeline
            .storage()
            .store(&data, &content_type, file_name.as_deref())
            .await
            .map_err(|e| state.fail("Upload failed", e))?;

        info!(
            "Stored upload {} ({} bytes) at {}",
            stored.file_name, stored.size_bytes, stored.url
        );

        return Ok(Json(json!({
            "success": true,
            "url": stored.url,
            "filename": stored.file_name,
            "size": stored.size_bytes,
        })));
    }

    Err(ApiError::new(
        StatusCode::BAD_REQUEST,
        "No audio file uploaded (expected multipart field 'audio')",
    ))
}

#[derive(Debug, Deserialize)]
pub struct TranscribeBody {
    #[serde(default)]
    pub audio_url: Option<String>,
}

pub async fn transcribe(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TranscribeBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let audio_url = required(body(payload)?.audio_url, "audio_url")?;

    let transcription = state
        .pipeline
        .transcriber()
        .transcribe(&audio_url)
        .await
        .map_err(|e| state.fail("Transcription failed", e))?;

    Ok(Json(json!({
        "success": true,
        "text": transcription.text,
        "chunks": transcription.segments,
        "output": transcription.raw,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageBody {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

pub async fn generate_image(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateImageBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = body(payload)?;
    let prompt = required(request.prompt, "prompt")?;
    let tier = Tier::from_premium(request.is_premium);

    let artifact = state
        .pipeline
        .generator()
        .generate(&prompt, tier)
        .await
        .map_err(|e| state.fail("Failed to generate image", e))?;

    Ok(Json(json!({
        "success": true,
        "imageUrl": artifact.url,
        "model": artifact.provider_model,
        "isPremium": tier.is_premium(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoBody {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Absent means premium: clients only call this route for premium users.
    #[serde(default)]
    pub is_premium: Option<bool>,
}

pub async fn generate_video(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateVideoBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = body(payload)?;
    let prompt = required(request.prompt, "prompt")?;
    let tier = Tier::from_premium(request.is_premium.unwrap_or(true));

    state
        .pipeline
        .check_video_tier(tier)
        .map_err(|e| state.fail("Video generation rejected", e))?;

    let artifact = state
        .pipeline
        .generator()
        .generate_video(&prompt, tier)
        .await
        .map_err(|e| state.fail("Failed to generate video", e))?;

    Ok(Json(json!({
        "success": true,
        "videoUrl": artifact.url,
        "model": artifact.provider_model,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeDreamBody {
    #[serde(default)]
    pub dream_text: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

pub async fn analyze_dream(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalyzeDreamBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = body(payload)?;
    let dream_text = required(request.dream_text, "dreamText")?;
    let tier = Tier::from_premium(request.is_premium);

    let interpretation = state
        .pipeline
        .interpreter()
        .interpret(&dream_text, tier)
        .await
        .map_err(|e| state.fail("Failed to analyze dream", e))?;

    Ok(Json(json!({
        "success": true,
        "analysis": interpretation.text,
        "isPremium": tier.is_premium(),
        "model": interpretation.model,
        "wordCount": interpretation.word_count,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamBody {
    #[serde(default)]
    pub dream_text: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub media: MediaKind,
}

pub async fn run_dream(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DreamBody>, JsonRejection>,
) -> ApiResult<Response> {
    let request = body(payload)?;
    let request = DreamRequest {
        source_text: request.dream_text,
        audio_ref: request.audio_url,
        tier: Tier::from_premium(request.is_premium),
        media: request.media,
    };

    let result = state
        .pipeline
        .run(request)
        .await
        .map_err(|e| state.fail("Dream pipeline failed", e))?;

    if result.is_completed() {
        return Ok(Json(result).into_response());
    }

    let status = result
        .stage_errors
        .values()
        .next()
        .map(|e| e.kind.status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let details = serde_json::to_value(&result)
        .map_err(|e| state.fail("Dream pipeline failed", e.into()))?;

    Ok(ApiError::new(status, "Dream pipeline did not complete")
        .with_details(details)
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct EchoQuery {
    pub url: Option<String>,
}

/// Diagnostic echo showing the payload `/api/stt` expects for a URL.
pub async fn echo(Query(query): Query<EchoQuery>) -> ApiResult<Json<Value>> {
    let url = required(query.url, "url")?;
    info!("Echo test for {}", url);
    Ok(Json(json!({
        "message": "Use POST /api/stt with this payload",
        "testUrl": url,
        "payload": { "audio_url": url },
    })))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
