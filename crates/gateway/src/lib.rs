//! HTTP API gateway for the wardrobe assistant.
//!
//! Serves the JSON API consumed by the web UI plus a health check.
//! Built on Axum; every route shares one [`WardrobeService`].

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use wardrobe_agent::{WardrobeAssistant, WardrobeService};
use wardrobe_config::{AppConfig, GatewayConfig};
use wardrobe_core::weather::Location;
use wardrobe_weather::OpenMeteoClient;

/// Origins always allowed: the web UI's local dev server.
const LOCAL_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - CORS restricted to local origins plus `gateway.allowed_origins`
/// - Request body limit of `gateway.max_body_mb` (scans carry base64 photos)
/// - HTTP trace logging
pub fn build_router(gateway: &GatewayConfig, api_state: api_v1::SharedApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(api_state))
        .layer(DefaultBodyLimit::max(gateway.max_body_mb * 1024 * 1024))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(extra_origins: &[String]) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = LOCAL_ORIGINS
        .iter()
        .copied()
        .map(HeaderValue::from_static)
        .collect();
    for origin in extra_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => origins.push(value),
            Err(_) => warn!(origin = %origin, "Ignoring invalid CORS origin"),
        }
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Wire the service from configuration.
pub fn build_service(config: &AppConfig) -> Result<WardrobeService, Box<dyn std::error::Error>> {
    let assistant = WardrobeAssistant::from_config(config)?;
    let weather = Arc::new(OpenMeteoClient::from_config(&config.weather)?);
    let store = wardrobe_store::from_config(&config.store);
    let home = Location::new(
        config.weather.latitude,
        config.weather.longitude,
        config.weather.location_label.clone(),
    );
    Ok(WardrobeService::new(
        assistant,
        store,
        weather,
        config.user_id.clone(),
        home,
    ))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() {
        warn!("No inference API key configured; scan, outfit and chat requests will fail");
    }

    let service = build_service(&config)?;
    let api_state = Arc::new(api_v1::ApiV1State { service });
    let app = build_router(&config.gateway, api_state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
