//! Configuration management for the gateway.

use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the standalone HTTP server
    pub port: u16,
    /// Credential for the text-completion API; `None` selects the mock provider
    pub openai_api_key: Option<String>,
    /// Credential for the video-search API; `None` selects the mock provider
    pub youtube_api_key: Option<String>,
    /// Completion model identifier
    pub model: String,
    /// Max output tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Bound on every upstream call
    pub upstream_timeout: Duration,
    /// Base URL of the OpenAI-compatible completion API
    pub openai_base_url: String,
    /// Base URL of the YouTube Data API
    pub youtube_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            openai_api_key: None,
            youtube_api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            upstream_timeout: Duration::from_secs(8),
            openai_base_url: "https://api.openai.com".to_string(),
            youtube_base_url: "https://www.googleapis.com".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let openai_api_key = match credential(&lookup, "OPENAI_API_KEY") {
            Some(key) => Some(key),
            None => match lookup("OPENAI_API_KEY_FILE") {
                Some(path) => read_key_file(&path)?,
                None => None,
            },
        };

        let timeout_secs = parse_or(
            &lookup,
            "UPSTREAM_TIMEOUT_SECS",
            defaults.upstream_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config(
                "UPSTREAM_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            openai_api_key,
            youtube_api_key: credential(&lookup, "YOUTUBE_API_KEY"),
            model: lookup("AI_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_or(&lookup, "MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_or(&lookup, "AI_TEMPERATURE", defaults.temperature)?,
            upstream_timeout: Duration::from_secs(timeout_secs),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            youtube_base_url: lookup("YOUTUBE_BASE_URL").unwrap_or(defaults.youtube_base_url),
        })
    }
}

/// Blank values count as absent.
fn credential<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_key_file(path: &str) -> Result<Option<String>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read key file {}: {}", path, e)))?;
    let key = contents.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
        None => Ok(default),
    }
}
