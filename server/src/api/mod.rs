//! Versioned HTTP routes over the device service.

mod devices;
mod responses;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use signet_core::DeviceOperations;
use tower_http::trace::TraceLayer;

use self::responses::ApiResponse;

/// The capability handlers consume, shared across workers.
pub type SharedService = Arc<dyn DeviceOperations>;

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/api/v0/health", get(health))
        .route(
            "/api/v0/devices/",
            axum::routing::post(devices::create_device).get(devices::list_devices),
        )
        .route(
            "/api/v0/devices/:device_id",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route(
            "/api/v0/devices/:device_id/sign",
            axum::routing::post(devices::sign_transaction),
        )
        .route(
            "/api/v0/devices/:device_id/signatures",
            get(devices::list_signatures),
        )
        .route(
            "/api/v0/devices/:device_id/signatures/:counter",
            get(devices::get_signature),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::new(HealthResponse {
        status: "pass",
        version: "v0",
    }))
}
