//! Device lifecycle and the signing protocol.
//!
//! [`DeviceService`] orchestrates the injected repository, key store, key
//! generator, signer factory, and signature store. It owns the sign lock
//! guarding the read-previous/compute-next/sign/append critical section, and
//! the clock the timestamps come from.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::DeviceError;
use crate::traits::{
    Clock, DeviceRepository, KeyGenerator, KeyStore, SignatureStore, SignerFactory, SystemClock,
};
use crate::types::{build_signed_data, Algorithm, Device, SignatureRecord};

/// User-provided data to create a new device.
#[derive(Debug, Clone)]
pub struct CreateDeviceInput {
    pub id: Uuid,
    pub algorithm: Algorithm,
    pub label: String,
}

/// Parameters for signing a payload.
#[derive(Debug, Clone)]
pub struct SignTransactionInput {
    pub device_id: Uuid,
    pub data: String,
}

/// Outcome of a signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    pub signature: String,
    pub signed_data: String,
    pub counter: u64,
}

/// The operation set adapters consume. Implemented by [`DeviceService`] and
/// by [`LoggedDeviceService`], so wiring can layer logging without the
/// adapter noticing.
pub trait DeviceOperations: Send + Sync {
    fn create_device(&self, input: CreateDeviceInput) -> Result<Device, DeviceError>;
    fn list_devices(&self) -> Result<Vec<Device>, DeviceError>;
    fn get_device(&self, id: Uuid) -> Result<Device, DeviceError>;
    fn update_device_label(&self, id: Uuid, label: &str) -> Result<Device, DeviceError>;
    fn delete_device(&self, id: Uuid) -> Result<(), DeviceError>;
    fn sign_transaction(&self, input: SignTransactionInput)
        -> Result<SignatureResult, DeviceError>;
    fn get_counters(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DeviceError>;
    fn list_signatures(&self, device_id: Uuid) -> Result<Vec<SignatureRecord>, DeviceError>;
    fn get_signature(&self, device_id: Uuid, counter: u64)
        -> Result<SignatureRecord, DeviceError>;
}

/// Encapsulates domain rules for managing devices and their signature chains.
pub struct DeviceService {
    repo: Arc<dyn DeviceRepository>,
    key_store: Arc<dyn KeyStore>,
    key_generator: Arc<dyn KeyGenerator>,
    signer_factory: Arc<dyn SignerFactory>,
    signature_store: Arc<dyn SignatureStore>,
    clock: Arc<dyn Clock>,
    // Guards Last -> Append so counters stay dense and every signature chains
    // to its true predecessor. Readers (counter snapshots) share it.
    sign_lock: RwLock<()>,
}

impl DeviceService {
    pub fn new(
        repo: Arc<dyn DeviceRepository>,
        key_store: Arc<dyn KeyStore>,
        key_generator: Arc<dyn KeyGenerator>,
        signer_factory: Arc<dyn SignerFactory>,
        signature_store: Arc<dyn SignatureStore>,
    ) -> DeviceService {
        DeviceService {
            repo,
            key_store,
            key_generator,
            signer_factory,
            signature_store,
            clock: Arc::new(SystemClock),
            sign_lock: RwLock::new(()),
        }
    }

    /// Override the clock source (mostly for tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> DeviceService {
        self.clock = clock;
        self
    }
}

impl DeviceOperations for DeviceService {
    fn create_device(&self, input: CreateDeviceInput) -> Result<Device, DeviceError> {
        let label = input.label.trim().to_owned();

        // Key generation happens before the repository insert so a duplicate
        // id costs nothing in the stores; the repository owns uniqueness.
        let material = self.key_generator.generate(input.algorithm)?;

        let now = self.clock.now();
        let device = Device {
            id: input.id,
            algorithm: input.algorithm,
            label,
            created_at: now,
            updated_at: now,
        };

        self.repo.create(device.clone())?;

        if let Err(err) = self.key_store.store(device.id, material) {
            // Compensate: no device may be observable without key material.
            let _ = self.repo.delete(device.id);
            return Err(DeviceError::internal(format!("store key material: {err}")));
        }

        Ok(device)
    }

    fn sign_transaction(
        &self,
        input: SignTransactionInput,
    ) -> Result<SignatureResult, DeviceError> {
        if input.data.trim().is_empty() {
            return Err(DeviceError::validation("data", "data is required"));
        }

        let device = self.repo.get(input.device_id)?;
        let material = self
            .key_store
            .load(device.id)
            .map_err(|e| DeviceError::internal(format!("load key material: {e}")))?;
        let signer = self
            .signer_factory
            .signer_for(&device, &material)
            .map_err(|e| DeviceError::internal(format!("resolve signer: {e}")))?;

        let _guard = self.sign_lock.write().unwrap();

        let previous = self.signature_store.last(device.id)?;
        let (reference, next_counter) = match &previous {
            None => (device.id.as_bytes().to_vec(), 1),
            Some(prev) => {
                let decoded = B64.decode(prev.signature.as_bytes()).map_err(|e| {
                    DeviceError::internal(format!("decode previous signature: {e}"))
                })?;
                (decoded, prev.counter + 1)
            }
        };

        let signed_data = build_signed_data(next_counter, &input.data, &reference);

        let signature_bytes = signer
            .sign(signed_data.as_bytes())
            .map_err(|e| DeviceError::internal(format!("sign payload: {e}")))?;

        let record = SignatureRecord {
            counter: 0, // assigned by the store on append
            signature: B64.encode(signature_bytes),
            signed_data,
            created_at: self.clock.now(),
        };

        let stored = self
            .signature_store
            .append(device.id, record)
            .map_err(|e| DeviceError::internal(format!("append signature record: {e}")))?;
        if stored.counter != next_counter {
            // Can only happen if another append interleaved despite the sign
            // lock, i.e. the store no longer upholds its atomicity contract.
            return Err(DeviceError::internal(format!(
                "signature counter advanced out of order: expected {next_counter}, got {}",
                stored.counter
            )));
        }

        Ok(SignatureResult {
            signature: stored.signature,
            signed_data: stored.signed_data,
            counter: stored.counter,
        })
    }

    fn update_device_label(&self, id: Uuid, label: &str) -> Result<Device, DeviceError> {
        let device = self.repo.get(id)?;
        let updated = device.with_label(label.trim(), self.clock.now());
        self.repo.update(updated.clone())?;
        Ok(updated)
    }

    fn get_device(&self, id: Uuid) -> Result<Device, DeviceError> {
        self.repo.get(id)
    }

    fn list_devices(&self) -> Result<Vec<Device>, DeviceError> {
        self.repo.list()
    }

    fn delete_device(&self, id: Uuid) -> Result<(), DeviceError> {
        // Teardown is best-effort: every step runs, the first failure wins.
        let mut first_error = None;
        if let Err(err) = self.repo.delete(id) {
            first_error.get_or_insert(err);
        }
        if let Err(err) = self.key_store.delete(id) {
            first_error.get_or_insert(err);
        }
        {
            // Exclusive sign lock: an in-flight sign for this device must not
            // interleave with the chain teardown.
            let _guard = self.sign_lock.write().unwrap();
            if let Err(err) = self.signature_store.delete(id) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn get_counters(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DeviceError> {
        // Shared sign lock: the snapshot stays consistent with in-flight signs.
        let _guard = self.sign_lock.read().unwrap();
        self.signature_store.counters(ids)
    }

    fn list_signatures(&self, device_id: Uuid) -> Result<Vec<SignatureRecord>, DeviceError> {
        self.signature_store.list(device_id)
    }

    fn get_signature(
        &self,
        device_id: Uuid,
        counter: u64,
    ) -> Result<SignatureRecord, DeviceError> {
        self.signature_store.get(device_id, counter)
    }
}

/// Pass-through wrapper emitting tracing events around each operation.
///
/// Semantics, ordering, and errors of the wrapped service are returned
/// verbatim; mutating operations log before the call, failures log on every
/// operation.
pub struct LoggedDeviceService<S> {
    inner: S,
}

impl<S: DeviceOperations> LoggedDeviceService<S> {
    pub fn new(inner: S) -> LoggedDeviceService<S> {
        LoggedDeviceService { inner }
    }
}

impl<S: DeviceOperations> DeviceOperations for LoggedDeviceService<S> {
    fn create_device(&self, input: CreateDeviceInput) -> Result<Device, DeviceError> {
        let id = input.id;
        info!(%id, algorithm = %input.algorithm, "device.create");
        let result = self.inner.create_device(input);
        if let Err(err) = &result {
            error!(%id, %err, "device.create.error");
        }
        result
    }

    fn sign_transaction(
        &self,
        input: SignTransactionInput,
    ) -> Result<SignatureResult, DeviceError> {
        let device_id = input.device_id;
        info!(%device_id, "device.sign");
        let result = self.inner.sign_transaction(input);
        if let Err(err) = &result {
            error!(%device_id, %err, "device.sign.error");
        }
        result
    }

    fn update_device_label(&self, id: Uuid, label: &str) -> Result<Device, DeviceError> {
        info!(%id, "device.update");
        let result = self.inner.update_device_label(id, label);
        if let Err(err) = &result {
            error!(%id, %err, "device.update.error");
        }
        result
    }

    fn delete_device(&self, id: Uuid) -> Result<(), DeviceError> {
        info!(%id, "device.delete");
        let result = self.inner.delete_device(id);
        if let Err(err) = &result {
            error!(%id, %err, "device.delete.error");
        }
        result
    }

    fn get_device(&self, id: Uuid) -> Result<Device, DeviceError> {
        let result = self.inner.get_device(id);
        if let Err(err) = &result {
            error!(%id, %err, "device.get.error");
        }
        result
    }

    fn list_devices(&self) -> Result<Vec<Device>, DeviceError> {
        let result = self.inner.list_devices();
        if let Err(err) = &result {
            error!(%err, "device.list.error");
        }
        result
    }

    fn get_counters(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DeviceError> {
        let result = self.inner.get_counters(ids);
        if let Err(err) = &result {
            error!(?ids, %err, "device.get.error");
        }
        result
    }

    fn list_signatures(&self, device_id: Uuid) -> Result<Vec<SignatureRecord>, DeviceError> {
        let result = self.inner.list_signatures(device_id);
        if let Err(err) = &result {
            error!(%device_id, %err, "signature.list.error");
        }
        result
    }

    fn get_signature(
        &self,
        device_id: Uuid,
        counter: u64,
    ) -> Result<SignatureRecord, DeviceError> {
        let result = self.inner.get_signature(device_id, counter);
        if let Err(err) = &result {
            error!(%device_id, counter, %err, "signature.get.error");
        }
        result
    }
}
