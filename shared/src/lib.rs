//! Shared library for the AI integration gateway.
//!
//! This crate provides the configuration, provider adapters, request
//! validation and endpoint handlers used by the gateway entry points.

pub mod clock;
pub mod completion;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;
pub mod validation;
pub mod video;

pub use completion::{LiveCompletion, MockCompletion, TextCompletion, TextCompletionProvider};
pub use config::Config;
pub use error::{Error, Leg, Result};
pub use gateway::{Gateway, COMBINED_MAX_RESULTS};
pub use models::{
    CombinedResponse, ProviderMode, RecommendationPayload, RecommendationRequest, ServiceInfo,
    TextPayload, TextRequest, TextResponse, VideoSummary,
};
pub use validation::{clamp_max_results, validate_recommendation, validate_text};
pub use video::{LiveVideoSearch, MockVideoSearch, VideoSearch, VideoSearchProvider};
