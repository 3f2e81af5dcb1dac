//! Video-search providers backed by the YouTube Data API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::models::{ProviderMode, VideoSummary};
use crate::{Error, Result};

/// Thumbnail shared by every mock result.
pub const MOCK_THUMBNAIL_URL: &str = "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg";

/// Safe-search level applied to every live query. Not client-overridable.
const SAFE_SEARCH: &str = "moderate";

/// Capability: relevance-ordered video search.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoSummary>>;

    /// Whether this provider reaches the real upstream.
    fn mode(&self) -> ProviderMode;
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchItem {
    fn into_summary(self) -> Option<VideoSummary> {
        let video_id = self.id.video_id?;
        let Snippet {
            title,
            channel_title,
            thumbnails,
        } = self.snippet;
        let thumbnail_url = thumbnails.medium.or(thumbnails.default).map(|t| t.url);

        Some(VideoSummary::new(title, video_id, thumbnail_url, channel_title))
    }
}

/// Client for the YouTube Data API v3 search endpoint.
#[derive(Debug, Clone)]
pub struct LiveVideoSearch {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl LiveVideoSearch {
    /// Create a live client. Fails with [`Error::Config`] without a credential.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .youtube_api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("YOUTUBE_API_KEY is required for live search".to_string()))?;

        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/youtube/v3/search",
                config.youtube_base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl VideoSearch for LiveVideoSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoSummary>> {
        debug!("Searching videos for {:?} (max {})", query, max_results);

        let max_results_param = max_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", max_results_param.as_str()),
                ("key", self.api_key.as_str()),
                ("safeSearch", SAFE_SEARCH),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Search API failed: {} - {}", status, body);
            return Err(Error::Upstream(format!("Search API returned {}", status)));
        }

        let listing: SearchListResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed search response: {}", e)))?;

        let total = listing.items.len();
        let mut videos: Vec<VideoSummary> = listing
            .items
            .into_iter()
            .filter_map(SearchItem::into_summary)
            .collect();

        if videos.len() < total {
            warn!("Skipped {} search results without a video id", total - videos.len());
        }

        videos.truncate(max_results as usize);
        Ok(videos)
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Live
    }
}

/// Credential-free stand-in producing predictable results.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockVideoSearch;

impl MockVideoSearch {
    /// Exactly `max_results` entries with ids `mock-video-1..=max_results`.
    pub fn results(query: &str, max_results: u32) -> Vec<VideoSummary> {
        (1..=max_results)
            .map(|i| {
                VideoSummary::new(
                    format!("Mock result {} for '{}'", i, query),
                    format!("mock-video-{}", i),
                    Some(MOCK_THUMBNAIL_URL.to_string()),
                    "Mock Channel",
                )
            })
            .collect()
    }
}

#[async_trait]
impl VideoSearch for MockVideoSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoSummary>> {
        Ok(Self::results(query, max_results))
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Mock
    }
}

/// The search provider selected for this process.
#[derive(Debug, Clone)]
pub enum VideoSearchProvider {
    Live(LiveVideoSearch),
    Mock(MockVideoSearch),
}

impl VideoSearchProvider {
    /// Live when a credential is configured, mock otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.youtube_api_key {
            Some(_) => Ok(Self::Live(LiveVideoSearch::new(config)?)),
            None => Ok(Self::Mock(MockVideoSearch)),
        }
    }
}

#[async_trait]
impl VideoSearch for VideoSearchProvider {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoSummary>> {
        match self {
            Self::Live(live) => live.search(query, max_results).await,
            Self::Mock(mock) => mock.search(query, max_results).await,
        }
    }

    fn mode(&self) -> ProviderMode {
        match self {
            Self::Live(live) => live.mode(),
            Self::Mock(mock) => mock.mode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn live_config(base_url: &str) -> Config {
        Config {
            youtube_api_key: Some("yt-test".to_string()),
            youtube_base_url: base_url.to_string(),
            upstream_timeout: Duration::from_secs(2),
            ..Config::default()
        }
    }

    /// Accepts connections and never answers.
    async fn silent_upstream() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_mock_results_are_predictable() {
        let videos = MockVideoSearch::results("derivatives", 3);
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["mock-video-1", "mock-video-2", "mock-video-3"]);
        assert!(videos
            .iter()
            .all(|v| v.thumbnail_url.as_deref() == Some(MOCK_THUMBNAIL_URL)));
        assert_eq!(videos[0].url, "https://www.youtube.com/watch?v=mock-video-1");
        assert_eq!(videos[2].title, "Mock result 3 for 'derivatives'");
    }

    #[test]
    fn test_mock_length_matches_request() {
        assert_eq!(MockVideoSearch::results("q", 1).len(), 1);
        assert_eq!(MockVideoSearch::results("q", 50).len(), 50);
    }

    #[test]
    fn test_live_without_credential_is_config_error() {
        let err = LiveVideoSearch::new(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_live_search_maps_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/youtube/v3/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "derivatives".into()),
                Matcher::UrlEncoded("type".into(), "video".into()),
                Matcher::UrlEncoded("maxResults".into(), "3".into()),
                Matcher::UrlEncoded("key".into(), "yt-test".into()),
                Matcher::UrlEncoded("safeSearch".into(), "moderate".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "items": [
                        {
                            "id": {"kind": "youtube#video", "videoId": "abc"},
                            "snippet": {
                                "title": "Derivatives in 10 minutes",
                                "channelTitle": "Calc Channel",
                                "thumbnails": {
                                    "default": {"url": "https://i.ytimg.com/vi/abc/default.jpg"},
                                    "medium": {"url": "https://i.ytimg.com/vi/abc/mqdefault.jpg"}
                                }
                            }
                        },
                        {
                            "id": {"kind": "youtube#video", "videoId": "def"},
                            "snippet": {
                                "title": "Chain rule",
                                "channelTitle": "Calc Channel",
                                "thumbnails": {
                                    "default": {"url": "https://i.ytimg.com/vi/def/default.jpg"}
                                }
                            }
                        },
                        {
                            "id": {"kind": "youtube#channel", "channelId": "UC123"},
                            "snippet": {"title": "A channel", "channelTitle": "A channel"}
                        },
                        {
                            "id": {"kind": "youtube#video", "videoId": "ghi"},
                            "snippet": {"title": "No thumbnails", "channelTitle": "Other"}
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = LiveVideoSearch::new(&live_config(&server.url())).unwrap();
        let videos = provider.search("derivatives", 3).await.unwrap();

        assert_eq!(videos.len(), 3);
        assert_eq!(videos[0].video_id, "abc");
        assert_eq!(
            videos[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/abc/mqdefault.jpg")
        );
        assert_eq!(
            videos[1].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/def/default.jpg")
        );
        assert_eq!(videos[1].url, "https://www.youtube.com/watch?v=def");
        assert_eq!(videos[2].video_id, "ghi");
        assert!(videos[2].thumbnail_url.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_live_truncates_to_requested_bound() {
        let mut server = mockito::Server::new_async().await;
        let items: Vec<_> = (0..5)
            .map(|i| json!({"id": {"videoId": format!("v{}", i)}, "snippet": {"title": "t", "channelTitle": "c"}}))
            .collect();
        server
            .mock("GET", "/youtube/v3/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "items": items }).to_string())
            .create_async()
            .await;

        let provider = LiveVideoSearch::new(&live_config(&server.url())).unwrap();
        let videos = provider.search("q", 2).await.unwrap();
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v0", "v1"]);
    }

    #[tokio::test]
    async fn test_live_error_status_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/search")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"quotaExceeded"}}"#)
            .create_async()
            .await;

        let provider = LiveVideoSearch::new(&live_config(&server.url())).unwrap();
        let err = provider.search("q", 5).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_live_timeout_is_upstream_error() {
        let config = Config {
            upstream_timeout: Duration::from_millis(300),
            ..live_config(&silent_upstream().await)
        };
        let provider = LiveVideoSearch::new(&config).unwrap();

        let err = provider.search("q", 5).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        match err {
            Error::Upstream(msg) => assert!(msg.starts_with("request timed out"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
