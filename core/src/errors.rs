use thiserror::Error;

/// Errors surfaced by device and signing operations.
///
/// Each variant is one error kind; the HTTP adapter maps kinds to status
/// codes. The core itself knows nothing about transports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Caller-supplied data is ill-formed.
    #[error("validation failed on '{field}': {message}")]
    Validation { field: &'static str, message: String },
    /// The requested resource does not exist.
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },
    /// State conflict, such as a duplicate device identifier.
    #[error("{0}")]
    Conflict(String),
    /// Server-side failure. The reason is surfaced; the cause stays in logs.
    #[error("{0}")]
    Internal(String),
}

impl DeviceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DeviceError::Validation { field, message: message.into() }
    }

    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        DeviceError::NotFound { resource, id: id.to_string() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        DeviceError::Conflict(reason.into())
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        DeviceError::Internal(reason.into())
    }

    /// The algorithm identifier is not one of the supported values.
    pub fn invalid_algorithm() -> Self {
        DeviceError::validation("algorithm", "unsupported algorithm")
    }

    /// The device identifier is not a well-formed UUID.
    pub fn invalid_device_id() -> Self {
        DeviceError::validation("id", "device ID must be a valid UUID")
    }

    /// A device with the requested identifier already exists.
    pub fn device_exists() -> Self {
        DeviceError::conflict("device already exists")
    }

    /// Key material is absent for a live device. Internal, not a user-visible
    /// NotFound: the device exists, so its keys must too.
    pub fn key_material_missing() -> Self {
        DeviceError::internal("key material missing")
    }
}
