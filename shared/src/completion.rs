//! Text-completion providers.
//!
//! [`TextCompletionProvider`] is chosen once at startup: the live variant
//! talks to an OpenAI-compatible chat completions endpoint, the mock variant
//! answers locally and is used whenever no credential is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::Config;
use crate::models::ProviderMode;
use crate::{Error, Result};

/// Number of leading characters of the user's text echoed by the mock.
const MOCK_ECHO_CHARS: usize = 100;

/// Capability: turn a user message (plus optional context) into one completion.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, text: &str, context: Option<&str>) -> Result<String>;

    /// Whether this provider reaches the real upstream.
    fn mode(&self) -> ProviderMode;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct LiveCompletion {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LiveCompletion {
    /// Create a live client. Fails with [`Error::Config`] without a credential.
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is required for live completions".to_string()))?;

        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn messages<'a>(text: &'a str, context: Option<&'a str>) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(context) = context {
            messages.push(ChatMessage {
                role: "system",
                content: context,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: text,
        });
        messages
    }
}

#[async_trait]
impl TextCompletion for LiveCompletion {
    async fn complete(&self, text: &str, context: Option<&str>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: Self::messages(text, context),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Requesting completion from model {}", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Completion API failed: {} - {}", status, body);
            return Err(Error::Upstream(format!("Completion API returned {}", status)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed completion response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::Upstream("Completion response has no content".to_string()))
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Live
    }
}

/// Credential-free stand-in that answers deterministically.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCompletion;

impl MockCompletion {
    /// The mock answer for `text` and `context`.
    pub fn respond(text: &str, context: Option<&str>) -> String {
        let echo: String = text.chars().take(MOCK_ECHO_CHARS).collect();
        format!(
            "This is a mock AI response to your input: '{}...'. \
             To enable real AI responses, please set your OPENAI_API_KEY environment variable. \
             Context provided: {}",
            echo,
            context.unwrap_or("None")
        )
    }
}

#[async_trait]
impl TextCompletion for MockCompletion {
    async fn complete(&self, text: &str, context: Option<&str>) -> Result<String> {
        Ok(Self::respond(text, context))
    }

    fn mode(&self) -> ProviderMode {
        ProviderMode::Mock
    }
}

/// The text provider selected for this process.
#[derive(Debug, Clone)]
pub enum TextCompletionProvider {
    Live(LiveCompletion),
    Mock(MockCompletion),
}

impl TextCompletionProvider {
    /// Live when a credential is configured, mock otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.openai_api_key {
            Some(_) => Ok(Self::Live(LiveCompletion::new(config)?)),
            None => Ok(Self::Mock(MockCompletion)),
        }
    }
}

#[async_trait]
impl TextCompletion for TextCompletionProvider {
    async fn complete(&self, text: &str, context: Option<&str>) -> Result<String> {
        match self {
            Self::Live(live) => live.complete(text, context).await,
            Self::Mock(mock) => mock.complete(text, context).await,
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
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: base_url.to_string(),
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
    fn test_mock_echoes_first_100_chars() {
        let text = "x".repeat(250);
        let response = MockCompletion::respond(&text, None);
        assert!(response.contains(&format!("'{}...'", "x".repeat(100))));
        assert!(!response.contains(&"x".repeat(101)));
        assert!(response.ends_with("Context provided: None"));
    }

    #[test]
    fn test_mock_echo_counts_characters_not_bytes() {
        let text = "é".repeat(150);
        let response = MockCompletion::respond(&text, Some("tutor"));
        assert!(response.contains(&"é".repeat(100)));
        assert!(!response.contains(&"é".repeat(101)));
        assert!(response.ends_with("Context provided: tutor"));
    }

    #[test]
    fn test_mock_is_deterministic() {
        let a = MockCompletion::respond("What is calculus?", Some("math"));
        let b = MockCompletion::respond("What is calculus?", Some("math"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_follows_credential() {
        let mock = TextCompletionProvider::from_config(&Config::default()).unwrap();
        assert_eq!(mock.mode(), ProviderMode::Mock);

        let live = TextCompletionProvider::from_config(&live_config("http://localhost")).unwrap();
        assert_eq!(live.mode(), ProviderMode::Live);
    }

    #[test]
    fn test_live_without_credential_is_config_error() {
        let err = LiveCompletion::new(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_live_completion_with_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "You are a tutor"},
                    {"role": "user", "content": "What is calculus?"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "  The study of change.\n"}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider = LiveCompletion::new(&live_config(&server.url())).unwrap();
        let answer = provider
            .complete("What is calculus?", Some("You are a tutor"))
            .await
            .unwrap();

        assert_eq!(answer, "The study of change.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_live_error_status_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"rate limited"}}"#)
            .create_async()
            .await;

        let provider = LiveCompletion::new(&live_config(&server.url())).unwrap();
        let err = provider.complete("hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_live_malformed_body_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let provider = LiveCompletion::new(&live_config(&server.url())).unwrap();
        let err = provider.complete("hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_live_empty_choices_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let provider = LiveCompletion::new(&live_config(&server.url())).unwrap();
        let err = provider.complete("hi", None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_live_timeout_is_upstream_error() {
        let config = Config {
            upstream_timeout: Duration::from_millis(300),
            ..live_config(&silent_upstream().await)
        };
        let provider = LiveCompletion::new(&config).unwrap();

        let err = provider.complete("hi", None).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        match err {
            Error::Upstream(msg) => assert!(msg.starts_with("request timed out"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
