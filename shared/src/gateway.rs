//! The gateway service: the three endpoint handlers over the selected providers.
//!
//! A [`Gateway`] is built once at startup and shared read-only across
//! requests. Provider selection happens in [`Gateway::from_config`] and never
//! changes afterwards; handlers never fall back from a failing live provider
//! to the mock.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::completion::{TextCompletion, TextCompletionProvider};
use crate::config::Config;
use crate::error::Leg;
use crate::models::{
    AiServiceInfo, CombinedResponse, ProviderMode, RecommendationRequest, ServiceInfo,
    TextRequest, TextResponse, VideoSummary, YoutubeServiceInfo,
};
use crate::video::{VideoSearch, VideoSearchProvider};
use crate::Result;

/// Result bound used by the combined endpoint, independent of client input.
pub const COMBINED_MAX_RESULTS: u32 = 5;

/// Endpoint handlers bound to one text provider and one search provider.
pub struct Gateway<T = TextCompletionProvider, V = VideoSearchProvider> {
    text: T,
    video: V,
    clock: Clock,
    config: Config,
}

impl Gateway {
    /// Select providers from the configured credentials.
    ///
    /// Fails only on misconfiguration, which is fatal at startup.
    pub fn from_config(config: Config) -> Result<Self> {
        let text = TextCompletionProvider::from_config(&config)?;
        let video = VideoSearchProvider::from_config(&config)?;

        info!(
            "AI service: {:?} (model {}), YouTube service: {:?}",
            text.mode(),
            config.model,
            video.mode()
        );

        Ok(Self::new(text, video, config))
    }
}

impl<T, V> Gateway<T, V>
where
    T: TextCompletion,
    V: VideoSearch,
{
    pub fn new(text: T, video: V, config: Config) -> Self {
        Self {
            text,
            video,
            clock: Clock::new(),
            config,
        }
    }

    /// Turn a message (and optional context) into a single completion.
    pub async fn process_text(&self, request: &TextRequest) -> Result<TextResponse> {
        let response = self
            .text
            .complete(&request.text, request.context.as_deref())
            .await?;

        Ok(TextResponse {
            response,
            timestamp: self.clock.timestamp(),
        })
    }

    /// Relevance-ordered videos for a query, at most `max_results` of them.
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<Vec<VideoSummary>> {
        let mut videos = self
            .video
            .search(&request.query, request.max_results)
            .await?;
        videos.truncate(request.max_results as usize);

        debug!("Returning {} recommendations", videos.len());
        Ok(videos)
    }

    /// Run the text and search legs concurrently and join them.
    ///
    /// Either leg failing fails the whole call with the leg identified; the
    /// other leg is dropped rather than awaited.
    pub async fn combined(&self, request: &TextRequest) -> Result<CombinedResponse> {
        let search = RecommendationRequest {
            query: request.text.clone(),
            max_results: COMBINED_MAX_RESULTS,
        };

        let (text_response, youtube_recommendations) = tokio::try_join!(
            async {
                self.process_text(request)
                    .await
                    .map_err(|e| e.in_leg(Leg::Text))
            },
            async {
                self.recommend(&search)
                    .await
                    .map_err(|e| e.in_leg(Leg::Search))
            },
        )?;

        Ok(CombinedResponse {
            text_response,
            youtube_recommendations,
        })
    }

    /// Describe the active providers.
    pub fn service_info(&self) -> ServiceInfo {
        let text_mode = self.text.mode();
        let video_mode = self.video.mode();

        ServiceInfo {
            ai_service: AiServiceInfo {
                provider: match text_mode {
                    ProviderMode::Live => "OpenAI".to_string(),
                    ProviderMode::Mock => "Mock AI Service".to_string(),
                },
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                api_configured: text_mode == ProviderMode::Live,
                mode: text_mode,
            },
            youtube_service: YoutubeServiceInfo {
                configured: video_mode == ProviderMode::Live,
                mode: video_mode,
            },
        }
    }
}
