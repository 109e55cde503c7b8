//! HTTP routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use moodscape_domain::{DomainError, FeelingRequest, StoryAnalysis, StoryRequest};

use crate::app::App;
use crate::infrastructure::ports::{FailureClass, ImageGenError};
use crate::use_cases::visualization::{
    EmotionCatalog, ServiceHealth, Visualization, VisualizationError,
};

pub const API_VERSION: &str = "2.1";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/v1/visualizations/feeling", post(visualize_feeling))
        .route("/api/v1/visualizations/story", post(visualize_story))
        .route("/api/v1/visualizations/emotions", get(list_emotions))
        .route("/api/v1/visualizations/health", get(visualization_health))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct FeelingVisualizationRequest {
    pub feeling_category: String,
    pub selected_emotions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoryVisualizationRequest {
    pub story_text: String,
    pub feeling_category: String,
    pub selected_emotions: Vec<String>,
}

/// Response envelope shared by every versioned endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: ResponseMeta::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: DateTime<Utc>,
    pub api_version: &'static str,
}

impl ResponseMeta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            api_version: API_VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct VisualizationData {
    /// Base64 encoded image bytes
    pub image_data: String,
    pub image_format: String,
    pub image_size: ImageSize,
    pub prompt_used: String,
    pub dominant_colors: Vec<String>,
    pub generation_time_ms: u64,
}

impl From<Visualization> for VisualizationData {
    fn from(v: Visualization) -> Self {
        Self {
            image_data: BASE64.encode(&v.outcome.image_data),
            image_format: v.outcome.format,
            image_size: ImageSize {
                width: v.outcome.width,
                height: v.outcome.height,
            },
            prompt_used: v.prompt_used,
            dominant_colors: v.dominant_colors,
            generation_time_ms: v.outcome.generation_time.as_millis() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoryVisualizationData {
    #[serde(flatten)]
    pub visualization: VisualizationData,
    pub story_analysis: StoryAnalysis,
}

// =============================================================================
// Visualizations
// =============================================================================

async fn visualize_feeling(
    State(app): State<Arc<App>>,
    body: Result<Json<FeelingVisualizationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<VisualizationData>>, ApiError> {
    let Json(body) = body?;
    let request = FeelingRequest::parse(&body.feeling_category, &body.selected_emotions)?;

    let visualization = app
        .use_cases
        .visualization
        .feeling
        .execute(&request)
        .await?;
    Ok(Json(ApiResponse::ok(visualization.into())))
}

async fn visualize_story(
    State(app): State<Arc<App>>,
    body: Result<Json<StoryVisualizationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<StoryVisualizationData>>, ApiError> {
    let Json(body) = body?;
    let request = StoryRequest::parse(
        &body.story_text,
        &body.feeling_category,
        &body.selected_emotions,
    )?;

    let result = app.use_cases.visualization.story.execute(&request).await?;
    Ok(Json(ApiResponse::ok(StoryVisualizationData {
        visualization: result.visualization.into(),
        story_analysis: result.analysis,
    })))
}

async fn list_emotions(State(app): State<Arc<App>>) -> Json<ApiResponse<EmotionCatalog>> {
    Json(ApiResponse::ok(app.use_cases.visualization.emotions.execute()))
}

async fn visualization_health(State(app): State<Arc<App>>) -> Json<ServiceHealth> {
    Json(app.use_cases.visualization.health.execute().await)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Body could not be read as the expected JSON
    BadRequest(String),
    Visualization(VisualizationError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Visualization(VisualizationError::Validation(e))
    }
}

impl From<VisualizationError> for ApiError {
    fn from(e: VisualizationError) -> Self {
        ApiError::Visualization(e)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, serde_json::Value) {
        let retry_later = serde_json::json!({ "suggestion": "Please try again in a few moments" });
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                serde_json::json!({}),
            ),
            ApiError::Visualization(VisualizationError::Validation(e)) => match e {
                DomainError::NarrativeTooShort { min, actual } => (
                    StatusCode::BAD_REQUEST,
                    "TEXT_TOO_SHORT",
                    "Please share more about your feelings".to_string(),
                    serde_json::json!({ "min_length": min, "actual_length": actual }),
                ),
                other => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    other.to_string(),
                    serde_json::json!({}),
                ),
            },
            ApiError::Visualization(VisualizationError::Generation(e)) => {
                let (status, code, message) = generation_failure(e);
                (status, code, message.to_string(), retry_later)
            }
            ApiError::Visualization(VisualizationError::Internal(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An unexpected error occurred".to_string(),
                serde_json::json!({ "suggestion": "Please try again later" }),
            ),
        }
    }
}

fn generation_failure(e: &ImageGenError) -> (StatusCode, &'static str, &'static str) {
    match e.class() {
        FailureClass::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            "GENERATION_TIMEOUT",
            "Image generation timed out. Please try again.",
        ),
        FailureClass::ContentFiltered => (
            StatusCode::BAD_REQUEST,
            "CONTENT_FILTERED",
            "Unable to create visualization for this input. Please try different wording.",
        ),
        FailureClass::Configuration => (
            StatusCode::SERVICE_UNAVAILABLE,
            "CONFIGURATION_ERROR",
            "Service configuration error. Please contact support.",
        ),
        FailureClass::Other => (
            StatusCode::SERVICE_UNAVAILABLE,
            "GENERATION_SERVICE_ERROR",
            "Image generation service is temporarily unavailable.",
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        match &self {
            ApiError::Visualization(VisualizationError::Generation(e))
                if code == "CONFIGURATION_ERROR" =>
            {
                tracing::error!(error = %e, "Image service is misconfigured");
            }
            ApiError::Visualization(VisualizationError::Generation(e)) => {
                tracing::warn!(error = %e, code, "Visualization generation failed");
            }
            ApiError::Visualization(VisualizationError::Internal(e)) => {
                tracing::error!(error = %e, "Unexpected visualization error");
            }
            _ => tracing::debug!(code, %message, "Rejected visualization request"),
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message,
                details,
            }),
            meta: ResponseMeta::now(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::ports::{ImageGenPort, ImageResult, MockImageGenPort};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const STORY: &str =
        "Every evening I sit alone in my new apartment and scroll through photos of old friends.";

    fn router(image_gen: Option<Arc<dyn ImageGenPort>>) -> Router {
        let mut config = AppConfig::from_lookup(|_| None).expect("default config");
        config.image_size = 64;
        let app = Arc::new(App::new(None, image_gen, &config));
        routes().with_state(app)
    }

    async fn send(router: Router, method: &str, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        let response = router.oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn feeling_returns_base64_placeholder_in_envelope() {
        let (status, body) = send(
            router(None),
            "POST",
            "/api/v1/visualizations/feeling",
            serde_json::json!({"feeling_category": "good", "selected_emotions": ["cozy", "chill"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["meta"]["api_version"], API_VERSION);
        let data = &body["data"];
        assert_eq!(data["image_format"], "png");
        assert_eq!(data["image_size"]["width"], 64);
        let encoded = data["image_data"].as_str().expect("base64 string");
        let png = BASE64.decode(encoded).expect("valid base64");
        assert!(image::load_from_memory(&png).is_ok());
        assert_eq!(data["dominant_colors"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn placeholder_render_failure_is_internal_error() {
        let mut config = AppConfig::from_lookup(|_| None).expect("default config");
        config.image_size = 0;
        let app = Arc::new(App::new(None, None, &config));

        let (status, body) = send(
            routes().with_state(app),
            "POST",
            "/api/v1/visualizations/feeling",
            serde_json::json!({"feeling_category": "bad", "selected_emotions": ["down"]}),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn unknown_emotion_is_a_validation_error() {
        let (status, body) = send(
            router(None),
            "POST",
            "/api/v1/visualizations/feeling",
            serde_json::json!({"feeling_category": "good", "selected_emotions": ["ecstatic"]}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("ecstatic")));
    }

    #[tokio::test]
    async fn short_story_is_text_too_short() {
        let (status, body) = send(
            router(None),
            "POST",
            "/api/v1/visualizations/story",
            serde_json::json!({
                "story_text": "too short",
                "feeling_category": "bad",
                "selected_emotions": ["down"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "TEXT_TOO_SHORT");
        assert_eq!(body["error"]["details"]["actual_length"], 9);
    }

    #[tokio::test]
    async fn story_returns_analysis_with_image() {
        let (status, body) = send(
            router(None),
            "POST",
            "/api/v1/visualizations/story",
            serde_json::json!({
                "story_text": STORY,
                "feeling_category": "bad",
                "selected_emotions": ["down", "blah"]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let analysis = &body["data"]["story_analysis"];
        assert_eq!(analysis["language"], "en");
        assert_eq!(analysis["factors"].as_array().map(Vec::len), Some(2));
        assert!(analysis["factors"][0]["insight"].is_string());
        assert!(body["data"]["image_data"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_keeps_the_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/visualizations/feeling")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .expect("valid request");
        let response = router(None).oneshot(request).await.expect("infallible");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn content_filter_maps_to_bad_request() {
        let mut mock = MockImageGenPort::new();
        mock.expect_generate()
            .times(1)
            .returning(|_| Err(ImageGenError::GenerationFailed("prompt blocked".to_string())));
        let port: Arc<dyn ImageGenPort> = Arc::new(mock);

        let (status, body) = send(
            router(Some(port)),
            "POST",
            "/api/v1/visualizations/feeling",
            serde_json::json!({"feeling_category": "bad", "selected_emotions": ["fuming"]}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONTENT_FILTERED");
    }

    #[tokio::test]
    async fn image_service_result_is_encoded() {
        let mut mock = MockImageGenPort::new();
        mock.expect_generate().returning(|_| {
            Ok(ImageResult {
                image_data: b"hello".to_vec(),
                format: "png".to_string(),
            })
        });
        let port: Arc<dyn ImageGenPort> = Arc::new(mock);

        let (status, body) = send(
            router(Some(port)),
            "POST",
            "/api/v1/visualizations/feeling",
            serde_json::json!({"feeling_category": "not_sure", "selected_emotions": ["blah"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["image_data"], "aGVsbG8=");
    }

    #[test]
    fn generation_errors_map_to_status_codes() {
        let cases = [
            (ImageGenError::Timeout { attempts: 3 }, StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT"),
            (
                ImageGenError::ContentFiltered("unsafe".to_string()),
                StatusCode::BAD_REQUEST,
                "CONTENT_FILTERED",
            ),
            (
                ImageGenError::Configuration("bad api key".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
                "CONFIGURATION_ERROR",
            ),
            (
                ImageGenError::GenerationFailed("connection reset".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
                "GENERATION_SERVICE_ERROR",
            ),
            (
                ImageGenError::GenerationFailed("deadline exceeded".to_string()),
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_TIMEOUT",
            ),

        ];
        for (error, status, code) in cases {
            let (got_status, got_code, _) = generation_failure(&error);
            assert_eq!((got_status, got_code), (status, code), "{error}");
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = ApiError::Visualization(VisualizationError::Internal("db exploded".to_string()));
        let (status, code, message, _) = error.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("db exploded"));
    }

    #[tokio::test]
    async fn emotions_and_health_endpoints_respond() {
        let (status, body) = send(router(None), "GET", "/api/v1/visualizations/emotions", serde_json::Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["all_emotions"].as_array().map(Vec::len), Some(11));
        assert_eq!(body["data"]["positive_emotions"][0], "super_happy");

        let (status, body) = send(router(None), "GET", "/api/v1/visualizations/health", serde_json::Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["image_service"]["status"], "not_configured");
    }
}
