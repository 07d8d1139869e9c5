//! Device and signature handlers with their wire DTOs.
//!
//! Path identifiers are parsed by hand so a malformed UUID or counter comes
//! back as a validation error in the standard envelope instead of a bare
//! routing failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_core::{
    Algorithm, CreateDeviceInput, Device, DeviceError, SignTransactionInput, SignatureRecord,
};
use uuid::Uuid;

use super::responses::{ApiError, ApiResponse};
use super::SharedService;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDeviceRequest {
    pub id: String,
    pub algorithm: String,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeviceRequest {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignRequest {
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct DevicePayload {
    pub id: String,
    pub algorithm: String,
    pub label: String,
    pub counter: u64,
}

#[derive(Debug, Serialize)]
pub struct SignResponse {
    pub signature: String,
    pub signed_data: String,
}

#[derive(Debug, Serialize)]
pub struct SignaturePayload {
    pub counter: u64,
    pub signature: String,
    pub signed_data: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_device(
    State(service): State<SharedService>,
    body: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<DevicePayload>>), ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid request payload"))?;
    let algorithm = Algorithm::parse(&request.algorithm)?;
    let id = parse_device_id(&request.id)?;

    let input = CreateDeviceInput {
        id,
        algorithm,
        label: request.label,
    };
    // Key generation is CPU heavy (RSA in particular); keep it off the
    // async workers.
    let device = tokio::task::spawn_blocking(move || service.create_device(input))
        .await
        .map_err(|e| DeviceError::internal(format!("create device task: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(device_payload(&device, 0))),
    ))
}

pub async fn list_devices(
    State(service): State<SharedService>,
) -> Result<Json<ApiResponse<Vec<DevicePayload>>>, ApiError> {
    let devices = service.list_devices()?;
    let ids: Vec<Uuid> = devices.iter().map(|device| device.id).collect();
    let counters = service.get_counters(&ids)?;
    let payloads = devices
        .iter()
        .map(|device| device_payload(device, counters.get(&device.id).copied().unwrap_or(0)))
        .collect();
    Ok(Json(ApiResponse::new(payloads)))
}

pub async fn get_device(
    State(service): State<SharedService>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<DevicePayload>>, ApiError> {
    let id = parse_device_id(&device_id)?;
    let device = service.get_device(id)?;
    let counter = current_counter(&service, id)?;
    Ok(Json(ApiResponse::new(device_payload(&device, counter))))
}

pub async fn update_device(
    State(service): State<SharedService>,
    Path(device_id): Path<String>,
    body: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<DevicePayload>>, ApiError> {
    let id = parse_device_id(&device_id)?;
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid request payload"))?;
    let device = service.update_device_label(id, &request.label)?;
    let counter = current_counter(&service, id)?;
    Ok(Json(ApiResponse::new(device_payload(&device, counter))))
}

pub async fn delete_device(
    State(service): State<SharedService>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_device_id(&device_id)?;
    service.delete_device(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sign_transaction(
    State(service): State<SharedService>,
    Path(device_id): Path<String>,
    body: Result<Json<SignRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SignResponse>>, ApiError> {
    let id = parse_device_id(&device_id)?;
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid request payload"))?;

    let input = SignTransactionInput {
        device_id: id,
        data: request.data,
    };
    let result = tokio::task::spawn_blocking(move || service.sign_transaction(input))
        .await
        .map_err(|e| DeviceError::internal(format!("sign task: {e}")))??;

    Ok(Json(ApiResponse::new(SignResponse {
        signature: result.signature,
        signed_data: result.signed_data,
    })))
}

pub async fn list_signatures(
    State(service): State<SharedService>,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SignaturePayload>>>, ApiError> {
    let id = parse_device_id(&device_id)?;
    let records = service.list_signatures(id)?;
    let payloads = records.into_iter().map(signature_payload).collect();
    Ok(Json(ApiResponse::new(payloads)))
}

pub async fn get_signature(
    State(service): State<SharedService>,
    Path((device_id, counter)): Path<(String, String)>,
) -> Result<Json<ApiResponse<SignaturePayload>>, ApiError> {
    let id = parse_device_id(&device_id)?;
    let counter = parse_counter(&counter)?;
    let record = service.get_signature(id, counter)?;
    Ok(Json(ApiResponse::new(signature_payload(record))))
}

fn parse_device_id(value: &str) -> Result<Uuid, DeviceError> {
    Uuid::parse_str(value.trim()).map_err(|_| DeviceError::invalid_device_id())
}

fn parse_counter(value: &str) -> Result<u64, DeviceError> {
    value
        .parse()
        .map_err(|_| DeviceError::validation("counter", "counter must be a positive integer"))
}

fn current_counter(service: &SharedService, id: Uuid) -> Result<u64, DeviceError> {
    let counters = service.get_counters(&[id])?;
    Ok(counters.get(&id).copied().unwrap_or(0))
}

fn device_payload(device: &Device, counter: u64) -> DevicePayload {
    DevicePayload {
        id: device.id.to_string(),
        algorithm: device.algorithm.as_str().to_string(),
        label: device.label.clone(),
        counter,
    }
}

fn signature_payload(record: SignatureRecord) -> SignaturePayload {
    SignaturePayload {
        counter: record.counter,
        signature: record.signature,
        signed_data: record.signed_data,
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_path_segment_must_be_an_unsigned_integer() {
        assert_eq!(parse_counter("7").unwrap(), 7);
        assert_eq!(parse_counter("0").unwrap(), 0);
        let err = parse_counter("foo").unwrap_err();
        assert_eq!(
            err,
            DeviceError::validation("counter", "counter must be a positive integer")
        );
        assert!(parse_counter("-1").is_err());
    }

    #[test]
    fn device_id_path_segment_must_be_a_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_device_id(&id.to_string()).unwrap(), id);
        assert_eq!(
            parse_device_id("not-a-uuid").unwrap_err(),
            DeviceError::invalid_device_id()
        );
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<CreateDeviceRequest>(
            r#"{"id": "x", "algorithm": "RSA", "extra": true}"#,
        );
        assert!(err.is_err());

        let ok: CreateDeviceRequest =
            serde_json::from_str(r#"{"id": "x", "algorithm": "RSA"}"#).unwrap();
        assert_eq!(ok.label, "");
    }

    #[test]
    fn signature_payload_uses_rfc3339_timestamps() {
        use chrono::TimeZone;

        let payload = signature_payload(SignatureRecord {
            counter: 1,
            signature: "c2ln".into(),
            signed_data: "1_sale_AQI=".into(),
            created_at: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        });
        let value = serde_json::to_value(payload).unwrap();
        assert_eq!(value["created_at"], "2024-01-02T03:04:05Z");
        assert_eq!(value["counter"], 1);
    }
}
