//! Response envelopes and the core-error to status-code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use signet_core::DeviceError;

/// Success envelope: `{"data": …}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> ApiResponse<T> {
        ApiResponse { data }
    }
}

/// Error envelope: `{"errors": […]}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<String>,
}

/// Adapter-side error: either a core error or a request the codec rejected.
#[derive(Debug)]
pub enum ApiError {
    Core(DeviceError),
    BadRequest(&'static str),
}

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> ApiError {
        ApiError::Core(err)
    }
}

pub fn status_for(err: &DeviceError) -> StatusCode {
    match err {
        DeviceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DeviceError::NotFound { .. } => StatusCode::NOT_FOUND,
        DeviceError::Conflict(_) => StatusCode::CONFLICT,
        DeviceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(err) => (status_for(&err), err.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.to_string()),
        };
        (
            status,
            Json(ErrorBody {
                errors: vec![message],
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_expected_statuses() {
        assert_eq!(
            status_for(&DeviceError::validation("data", "data is required")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DeviceError::not_found("device", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DeviceError::device_exists()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DeviceError::key_material_missing()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn envelopes_serialize_to_the_wire_shape() {
        let ok = serde_json::to_value(ApiResponse::new(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({"data": [1, 2]}));

        let err = serde_json::to_value(ErrorBody {
            errors: vec!["device 'x' not found".into()],
        })
        .unwrap();
        assert_eq!(err, serde_json::json!({"errors": ["device 'x' not found"]}));
    }
}
