//! Capability traits the service is assembled from. Implementers decide how
//! devices, key material, and signature chains are persisted; the in-memory
//! versions live in [`crate::memory`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::DeviceError;
use crate::types::{Algorithm, Device, KeyMaterial, SignatureRecord};

/// Persistence for device metadata.
pub trait DeviceRepository: Send + Sync {
    /// Insert a new device. Fails with a conflict if the identifier is taken.
    fn create(&self, device: Device) -> Result<(), DeviceError>;
    /// Fetch a device by identifier.
    fn get(&self, id: Uuid) -> Result<Device, DeviceError>;
    /// All devices, in unspecified order.
    fn list(&self) -> Result<Vec<Device>, DeviceError>;
    /// Replace the stored device. Fails if the identifier is absent.
    fn update(&self, device: Device) -> Result<(), DeviceError>;
    /// Remove a device. Deleting an absent identifier succeeds.
    fn delete(&self, id: Uuid) -> Result<(), DeviceError>;
}

/// Key custody, stored independently of device metadata.
pub trait KeyStore: Send + Sync {
    /// Persist key material for a device, overwriting any previous value.
    fn store(&self, device_id: Uuid, material: KeyMaterial) -> Result<(), DeviceError>;
    /// Fetch key material. Missing material for a live device is an internal
    /// fault, not a user-visible NotFound.
    fn load(&self, device_id: Uuid) -> Result<KeyMaterial, DeviceError>;
    /// Remove key material. Idempotent.
    fn delete(&self, device_id: Uuid) -> Result<(), DeviceError>;
}

/// Append-only signature history per device.
pub trait SignatureStore: Send + Sync {
    /// Append a record, assigning `current length + 1` as its counter.
    /// Atomic with respect to `last` and other appends for the same device.
    fn append(
        &self,
        device_id: Uuid,
        record: SignatureRecord,
    ) -> Result<SignatureRecord, DeviceError>;
    /// All records for a device in ascending counter order.
    fn list(&self, device_id: Uuid) -> Result<Vec<SignatureRecord>, DeviceError>;
    /// Fetch one record by counter. Counter 0 or past the chain end is NotFound.
    fn get(&self, device_id: Uuid, counter: u64) -> Result<SignatureRecord, DeviceError>;
    /// The most recent record, if any.
    fn last(&self, device_id: Uuid) -> Result<Option<SignatureRecord>, DeviceError>;
    /// Chain length for each requested id (0 if unknown), taken under a
    /// single read lock.
    fn counters(&self, device_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DeviceError>;
    /// Drop the entire chain for a device. Idempotent.
    fn delete(&self, device_id: Uuid) -> Result<(), DeviceError>;
}

/// Produces serialized key pairs for the supported algorithms.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, algorithm: Algorithm) -> Result<KeyMaterial, DeviceError>;
}

/// One-shot signing capability over a deserialized private key.
///
/// Signers are constructed fresh per signing operation and hold no mutable
/// state between calls.
pub trait Signer {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DeviceError>;
}

/// Resolves a signer for a device's algorithm and key material.
pub trait SignerFactory: Send + Sync {
    fn signer_for(
        &self,
        device: &Device,
        material: &KeyMaterial,
    ) -> Result<Box<dyn Signer>, DeviceError>;
}

/// Clock capability. Tests substitute fixed instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
