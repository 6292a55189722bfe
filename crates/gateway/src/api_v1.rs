//! HTTP API v1 — JSON endpoints for the wardrobe web UI.
//!
//! Endpoints:
//!
//! - `GET    /v1/weather`          Current weather plus report (`?lat=&lon=` optional)
//! - `GET    /v1/wardrobe`         List stored items
//! - `DELETE /v1/wardrobe/{id}`    Remove an item
//! - `POST   /v1/wardrobe/scan`    Classify photos (data URIs) and store them
//! - `POST   /v1/outfit`           Recommend an outfit (`lat`/`lon` optional)
//! - `POST   /v1/chat`             Chat with the stylist (`lat`/`lon` optional)
//! - `GET    /v1/feedback`         List feedback
//! - `POST   /v1/feedback`         Add feedback
//!
//! Inference failures are returned as `{kind, message, raw_output?}` with a
//! status derived from the failure kind.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use wardrobe_agent::WardrobeService;
use wardrobe_core::cancel::CancellationToken;
use wardrobe_core::error::{Error, FailureKind, StoreError};
use wardrobe_core::inference::{ChatTurn, ImagePayload};
use wardrobe_core::wardrobe::{FeedbackRecord, OutfitPlan, WardrobeItem};
use wardrobe_core::weather::{Location, WeatherSnapshot};
use wardrobe_weather::weather_report;

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of photos accepted by one scan request.
const MAX_SCAN_IMAGES: usize = 10;

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub service: WardrobeService,
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/weather", get(weather_handler))
        .route("/wardrobe", get(list_items_handler))
        .route("/wardrobe/{id}", delete(delete_item_handler))
        .route("/wardrobe/scan", post(scan_handler))
        .route("/outfit", post(outfit_handler))
        .route("/chat", post(chat_handler))
        .route(
            "/feedback",
            get(list_feedback_handler).post(create_feedback_handler),
        )
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            kind: "invalid_input".into(),
            message: message.into(),
            raw_output: None,
        }),
    )
}

/// HTTP status for an inference failure kind.
pub fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::ExternalServiceUnavailable | FailureKind::EmptyResponse => {
            StatusCode::BAD_GATEWAY
        }
        FailureKind::MalformedModelOutput => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
    }
}

fn api_error(err: Error) -> ApiError {
    let (status, kind, raw_output) = match &err {
        Error::Inference(failure) => (
            failure_status(failure.kind),
            failure.kind.as_str().to_string(),
            failure.raw_output.clone(),
        ),
        Error::Image(_) => (StatusCode::BAD_REQUEST, "invalid_image".to_string(), None),
        Error::Store(StoreError::InvalidRecord(_)) => {
            (StatusCode::BAD_REQUEST, "invalid_input".to_string(), None)
        }
        Error::Weather(_) => (StatusCode::BAD_GATEWAY, "weather_unavailable".to_string(), None),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal".to_string(), None),
    };

    let message = match &err {
        Error::Inference(failure) => failure.message.clone(),
        other => other.to_string(),
    };
    if status.is_server_error() {
        warn!(status = status.as_u16(), kind = %kind, error = %message, "v1 request failed");
    }

    (
        status,
        Json(ErrorResponse {
            kind,
            message,
            raw_output,
        }),
    )
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    pub report: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<WardrobeItem>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    /// `data:image/...;base64,...` URIs, one per photo.
    images: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OutfitRequest {
    #[serde(default)]
    destination: String,
    #[serde(default)]
    activity: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// The plan plus the weather it was planned for.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutfitResponse {
    #[serde(flatten)]
    pub plan: OutfitPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackListResponse {
    pub feedback: Vec<FeedbackRecord>,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    score: u8,
    #[serde(default)]
    comment: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// The caller's location when both coordinates are given; `None` means home.
fn requested_location(lat: Option<f64>, lon: Option<f64>) -> Result<Option<Location>, ApiError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let location = Location::new(lat, lon, "Current location");
            if !location.is_valid() {
                return Err(bad_request(format!("coordinates ({lat}, {lon}) are out of range")));
            }
            Ok(Some(location))
        }
        (None, None) => Ok(None),
        _ => Err(bad_request("lat and lon must be given together")),
    }
}

async fn weather_handler(
    State(state): State<SharedApiState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let location = requested_location(query.lat, query.lon)?;
    let snapshot = state
        .service
        .weather_at(location.as_ref())
        .await
        .map_err(api_error)?;
    let report = weather_report(&snapshot);
    Ok(Json(WeatherResponse { snapshot, report }))
}

async fn list_items_handler(
    State(state): State<SharedApiState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let items = state.service.items().await.map_err(api_error)?;
    Ok(Json(ItemListResponse {
        count: items.len(),
        items,
    }))
}

async fn delete_item_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.service.remove_item(&id).await.map_err(api_error)? {
        info!(item = %id, "Wardrobe item removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                kind: "not_found".into(),
                message: format!("no wardrobe item with id {id}"),
                raw_output: None,
            }),
        ))
    }
}

async fn scan_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ItemListResponse>), ApiError> {
    if payload.images.is_empty() {
        return Err(bad_request("at least one image is required"));
    }
    if payload.images.len() > MAX_SCAN_IMAGES {
        return Err(bad_request(format!(
            "at most {MAX_SCAN_IMAGES} images per scan, got {}",
            payload.images.len()
        )));
    }

    let images = payload
        .images
        .iter()
        .map(|uri| ImagePayload::from_data_uri(uri))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| api_error(e.into()))?;

    info!(images = images.len(), "v1/wardrobe/scan request");
    let items = state
        .service
        .scan(images, Some(payload.images), &CancellationToken::new())
        .await
        .map_err(api_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ItemListResponse {
            count: items.len(),
            items,
        }),
    ))
}

async fn outfit_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<OutfitRequest>,
) -> Result<Json<OutfitResponse>, ApiError> {
    let location = requested_location(payload.lat, payload.lon)?;
    info!(destination = %payload.destination, activity = %payload.activity, "v1/outfit request");
    let recommendation = state
        .service
        .recommend(
            &payload.destination,
            &payload.activity,
            location.as_ref(),
            &CancellationToken::new(),
        )
        .await
        .map_err(api_error)?;
    Ok(Json(OutfitResponse {
        plan: recommendation.plan,
        weather: recommendation.weather,
    }))
}

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    let location = requested_location(payload.lat, payload.lon)?;
    info!(
        message_len = payload.message.len(),
        history = payload.history.len(),
        "v1/chat request"
    );
    let reply = state
        .service
        .chat(
            &payload.message,
            &payload.history,
            location.as_ref(),
            &CancellationToken::new(),
        )
        .await
        .map_err(api_error)?;
    Ok(Json(ChatResponse { reply }))
}

async fn list_feedback_handler(
    State(state): State<SharedApiState>,
) -> Result<Json<FeedbackListResponse>, ApiError> {
    let feedback = state.service.feedback().await.map_err(api_error)?;
    Ok(Json(FeedbackListResponse { feedback }))
}

async fn create_feedback_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRecord>), ApiError> {
    let record = state
        .service
        .add_feedback(payload.score, &payload.comment)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}
