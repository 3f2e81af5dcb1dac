//! Request routing for the gateway endpoints.
//!
//! Endpoints:
//! - GET /health - Liveness check
//! - GET / - Service metadata and endpoint map
//! - GET /api/service-info - Active provider configuration
//! - POST /api/process-text - Single completion
//! - POST /api/youtube-recommendations - Video recommendations
//! - POST /api/combined-response - Completion plus recommendations

use std::sync::Arc;

use lambda_http::http::HeaderValue;
use lambda_http::{Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{error_response, json_response, no_content, parse_json_body, with_cors};
use shared::{
    validate_recommendation, validate_text, Gateway, RecommendationPayload, TextPayload,
};
use tracing::{error, info};
use uuid::Uuid;

/// Name reported by `/health` and `/`.
pub const SERVICE_NAME: &str = "AI Integration Gateway";

const KNOWN_PATHS: [&str; 6] = [
    "/",
    "/health",
    "/api/service-info",
    "/api/process-text",
    "/api/youtube-recommendations",
    "/api/combined-response",
];

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Debug, Serialize)]
struct EndpointMap {
    text_processing: &'static str,
    youtube_recommendations: &'static str,
    combined_response: &'static str,
    service_info: &'static str,
    health: &'static str,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    endpoints: EndpointMap,
}

fn root_info() -> RootResponse {
    RootResponse {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: EndpointMap {
            text_processing: "/api/process-text",
            youtube_recommendations: "/api/youtube-recommendations",
            combined_response: "/api/combined-response",
            service_info: "/api/service-info",
            health: "/health",
        },
    }
}

/// Map a gateway error to a client response without leaking upstream detail.
fn failure(err: &shared::Error, summary: &str) -> Result<Response<Body>, Error> {
    match err {
        shared::Error::Validation(message) => error_response(400, message.clone()),
        _ => {
            error!("{}: {}", summary, err);
            error_response(err.status_code(), summary)
        }
    }
}

async fn process_text(state: &Gateway, body: &Body) -> Result<Response<Body>, Error> {
    const SUMMARY: &str = "Text processing failed";

    let request = match parse_json_body::<TextPayload>(body).and_then(validate_text) {
        Ok(request) => request,
        Err(e) => return failure(&e, SUMMARY),
    };

    match state.process_text(&request).await {
        Ok(response) => json_response(200, &response),
        Err(e) => failure(&e, SUMMARY),
    }
}

async fn youtube_recommendations(state: &Gateway, body: &Body) -> Result<Response<Body>, Error> {
    const SUMMARY: &str = "YouTube recommendations failed";

    let request =
        match parse_json_body::<RecommendationPayload>(body).and_then(validate_recommendation) {
            Ok(request) => request,
            Err(e) => return failure(&e, SUMMARY),
        };

    match state.recommend(&request).await {
        Ok(videos) => json_response(200, &videos),
        Err(e) => failure(&e, SUMMARY),
    }
}

async fn combined_response(state: &Gateway, body: &Body) -> Result<Response<Body>, Error> {
    let request = match parse_json_body::<TextPayload>(body).and_then(validate_text) {
        Ok(request) => request,
        Err(e) => return failure(&e, "Combined response failed"),
    };

    match state.combined(&request).await {
        Ok(combined) => json_response(200, &combined),
        Err(e) => match e.leg() {
            Some(leg) => failure(&e, &format!("Combined response failed ({} leg)", leg)),
            None => failure(&e, "Combined response failed"),
        },
    }
}

/// Route one request. Every response carries CORS headers and a request id.
pub async fn handler(state: Arc<Gateway>, event: Request) -> Result<Response<Body>, Error> {
    let request_id = Uuid::new_v4();
    let method = event.method().as_str();
    let path = event.uri().path();

    info!("Gateway request {}: {} {}", request_id, method, path);

    let response = match (method, path) {
        ("OPTIONS", _) => no_content()?,
        ("GET", "/health") => json_response(
            200,
            &HealthResponse {
                status: "healthy",
                service: SERVICE_NAME,
            },
        )?,
        ("GET", "/") => json_response(200, &root_info())?,
        ("GET", "/api/service-info") => json_response(200, &state.service_info())?,
        ("POST", "/api/process-text") => process_text(&state, event.body()).await?,
        ("POST", "/api/youtube-recommendations") => {
            youtube_recommendations(&state, event.body()).await?
        }
        ("POST", "/api/combined-response") => combined_response(&state, event.body()).await?,
        (_, path) if KNOWN_PATHS.contains(&path) => error_response(405, "Method not allowed")?,
        _ => error_response(404, "Not found")?,
    };

    stamp(response, request_id)
}

/// Attach CORS headers and the request id to an outgoing response.
pub fn stamp(response: Response<Body>, request_id: Uuid) -> Result<Response<Body>, Error> {
    let mut response = with_cors(response);
    response
        .headers_mut()
        .insert("x-request-id", HeaderValue::from_str(&request_id.to_string())?);
    Ok(response)
}
