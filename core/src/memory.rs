//! In-memory store implementations suitable for tests and single-process
//! deployments. Each store owns one readers-writer lock; reads proceed in
//! parallel, writes are exclusive. Values are copied in and out so callers
//! can never mutate stored state through a returned reference.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::errors::DeviceError;
use crate::traits::{DeviceRepository, KeyStore, SignatureStore};
use crate::types::{Device, KeyMaterial, SignatureRecord};

/// Device metadata keyed by identifier.
#[derive(Default)]
pub struct InMemoryDeviceRepository {
    inner: RwLock<HashMap<Uuid, Device>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> InMemoryDeviceRepository {
        InMemoryDeviceRepository::default()
    }
}

impl DeviceRepository for InMemoryDeviceRepository {
    fn create(&self, device: Device) -> Result<(), DeviceError> {
        let mut devices = self.inner.write().unwrap();
        if devices.contains_key(&device.id) {
            return Err(DeviceError::device_exists());
        }
        devices.insert(device.id, device);
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Device, DeviceError> {
        self.inner
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| DeviceError::not_found("device", id))
    }

    fn list(&self) -> Result<Vec<Device>, DeviceError> {
        Ok(self.inner.read().unwrap().values().cloned().collect())
    }

    fn update(&self, device: Device) -> Result<(), DeviceError> {
        let mut devices = self.inner.write().unwrap();
        if !devices.contains_key(&device.id) {
            return Err(DeviceError::not_found("device", device.id));
        }
        devices.insert(device.id, device);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), DeviceError> {
        self.inner.write().unwrap().remove(&id);
        Ok(())
    }
}

/// Key material keyed by device identifier.
#[derive(Default)]
pub struct InMemoryKeyStore {
    inner: RwLock<HashMap<Uuid, KeyMaterial>>,
}

impl InMemoryKeyStore {
    pub fn new() -> InMemoryKeyStore {
        InMemoryKeyStore::default()
    }
}

impl KeyStore for InMemoryKeyStore {
    fn store(&self, device_id: Uuid, material: KeyMaterial) -> Result<(), DeviceError> {
        self.inner.write().unwrap().insert(device_id, material);
        Ok(())
    }

    fn load(&self, device_id: Uuid) -> Result<KeyMaterial, DeviceError> {
        self.inner
            .read()
            .unwrap()
            .get(&device_id)
            .cloned()
            .ok_or_else(DeviceError::key_material_missing)
    }

    fn delete(&self, device_id: Uuid) -> Result<(), DeviceError> {
        self.inner.write().unwrap().remove(&device_id);
        Ok(())
    }
}

/// Per-device signature chains. The append path assigns counters from the
/// chain length under the write lock, so counters stay dense as long as
/// callers serialize their read-then-append sequences.
#[derive(Default)]
pub struct InMemorySignatureStore {
    inner: RwLock<HashMap<Uuid, Vec<SignatureRecord>>>,
}

impl InMemorySignatureStore {
    pub fn new() -> InMemorySignatureStore {
        InMemorySignatureStore::default()
    }
}

impl SignatureStore for InMemorySignatureStore {
    fn append(
        &self,
        device_id: Uuid,
        record: SignatureRecord,
    ) -> Result<SignatureRecord, DeviceError> {
        let mut chains = self.inner.write().unwrap();
        let chain = chains.entry(device_id).or_default();
        let stored = SignatureRecord {
            counter: chain.len() as u64 + 1,
            ..record
        };
        chain.push(stored.clone());
        Ok(stored)
    }

    fn list(&self, device_id: Uuid) -> Result<Vec<SignatureRecord>, DeviceError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .get(&device_id)
            .map(|chain| chain.to_vec())
            .unwrap_or_default())
    }

    fn get(&self, device_id: Uuid, counter: u64) -> Result<SignatureRecord, DeviceError> {
        let chains = self.inner.read().unwrap();
        let chain = chains.get(&device_id).map(Vec::as_slice).unwrap_or(&[]);
        if counter == 0 || counter > chain.len() as u64 {
            return Err(DeviceError::not_found(
                "signature",
                format!("{device_id}#{counter}"),
            ));
        }
        Ok(chain[counter as usize - 1].clone())
    }

    fn last(&self, device_id: Uuid) -> Result<Option<SignatureRecord>, DeviceError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .get(&device_id)
            .and_then(|chain| chain.last().cloned()))
    }

    fn counters(&self, device_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, DeviceError> {
        let chains = self.inner.read().unwrap();
        Ok(device_ids
            .iter()
            .map(|id| (*id, chains.get(id).map_or(0, |chain| chain.len() as u64)))
            .collect())
    }

    fn delete(&self, device_id: Uuid) -> Result<(), DeviceError> {
        self.inner.write().unwrap().remove(&device_id);
        Ok(())
    }
}
