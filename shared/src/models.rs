//! Shared data models.

use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Raw body of `/api/process-text` and `/api/combined-response`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TextPayload {
    #[validate(required(message = "Text is required"))]
    pub text: Option<String>,
    pub context: Option<String>,
}

/// Raw body of `/api/youtube-recommendations`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RecommendationPayload {
    #[validate(required(message = "Query is required"))]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "saturating_count")]
    pub max_results: Option<i64>,
}

/// Accept any integral JSON number, saturating at the `i64` range.
/// Integral floats such as `3.0` or `1e2` count as integers.
fn saturating_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Some(n) = number.as_i64() {
        return Ok(Some(n));
    }
    if number.as_u64().is_some() {
        return Ok(Some(i64::MAX));
    }
    match number.as_f64() {
        // `as` saturates out-of-range floats
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => Err(de::Error::custom(format!(
            "max_results must be an integer, got {}",
            number
        ))),
    }
}

/// Validated text request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub text: String,
    /// Becomes a system-level instruction when present
    pub context: Option<String>,
}

/// Validated recommendation request with the result bound already clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub query: String,
    pub max_results: u32,
}

/// Text completion response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub response: String,
    /// RFC 3339 instant at which the completion was produced
    pub timestamp: String,
}

/// A single video recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub video_id: String,
    pub thumbnail_url: Option<String>,
    pub channel_name: String,
    pub url: String,
}

impl VideoSummary {
    /// Build a summary whose `url` is derived from `video_id`.
    pub fn new(
        title: impl Into<String>,
        video_id: impl Into<String>,
        thumbnail_url: Option<String>,
        channel_name: impl Into<String>,
    ) -> Self {
        let video_id = video_id.into();
        Self {
            title: title.into(),
            url: watch_url(&video_id),
            video_id,
            thumbnail_url,
            channel_name: channel_name.into(),
        }
    }
}

/// Combined response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedResponse {
    pub text_response: TextResponse,
    pub youtube_recommendations: Vec<VideoSummary>,
}

/// Whether a capability is served by the real upstream or the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    Live,
    Mock,
}

/// Text provider description for `/api/service-info`.
#[derive(Debug, Clone, Serialize)]
pub struct AiServiceInfo {
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_configured: bool,
    pub mode: ProviderMode,
}

/// Search provider description for `/api/service-info`.
#[derive(Debug, Clone, Serialize)]
pub struct YoutubeServiceInfo {
    pub configured: bool,
    pub mode: ProviderMode,
}

/// Service info response payload.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub ai_service: AiServiceInfo,
    pub youtube_service: YoutubeServiceInfo,
}
