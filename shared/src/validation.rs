//! Request validation and normalization.
//!
//! Runs before any provider call so invalid input never causes upstream work.

use tracing::warn;
use validator::{Validate, ValidationErrors};

use crate::models::{RecommendationPayload, RecommendationRequest, TextPayload, TextRequest};
use crate::{Error, Result};

/// Result count used when the client does not send `max_results`.
pub const DEFAULT_MAX_RESULTS: u32 = 10;
/// Smallest accepted result count.
pub const MIN_MAX_RESULTS: u32 = 1;
/// Largest accepted result count.
pub const MAX_MAX_RESULTS: u32 = 50;

/// Clamp a requested result count into `[MIN_MAX_RESULTS, MAX_MAX_RESULTS]`.
///
/// Out-of-range values are pulled to the nearest bound instead of rejected.
pub fn clamp_max_results(requested: Option<i64>) -> u32 {
    match requested {
        None => DEFAULT_MAX_RESULTS,
        Some(n) => n.clamp(MIN_MAX_RESULTS as i64, MAX_MAX_RESULTS as i64) as u32,
    }
}

/// Validate the body of the text and combined endpoints.
pub fn validate_text(mut payload: TextPayload) -> Result<TextRequest> {
    payload.text = payload.text.filter(|text| !text.trim().is_empty());
    payload.validate().map_err(rejection)?;

    Ok(TextRequest {
        text: payload.text.unwrap_or_default(),
        context: payload.context,
    })
}

/// Validate the body of the recommendation endpoint.
pub fn validate_recommendation(mut payload: RecommendationPayload) -> Result<RecommendationRequest> {
    payload.query = payload.query.filter(|query| !query.trim().is_empty());
    payload.validate().map_err(rejection)?;

    Ok(RecommendationRequest {
        query: payload.query.unwrap_or_default(),
        max_results: clamp_max_results(payload.max_results),
    })
}

fn rejection(errors: ValidationErrors) -> Error {
    let message = errors
        .field_errors()
        .into_values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request body".to_string());

    warn!("Rejected request: {}", message);
    Error::Validation(message)
}
