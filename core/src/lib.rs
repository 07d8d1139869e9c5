//! Signet core library: signature devices, key custody, and signature chains.
//!
//! Implements the device/signing engine the HTTP server exposes:
//! - Device lifecycle with per-device RSA or ECDSA key material
//! - Tamper-evident signature chains: every signature carries a dense,
//!   monotone counter and embeds the previous signature's raw bytes
//! - Pluggable persistence behind repository/store traits, with in-memory
//!   reference implementations
//! - A logging decorator around the service operations

pub mod errors;
pub mod keygen;
pub mod memory;
pub mod service;
pub mod signer;
pub mod traits;
pub mod types;

pub use errors::DeviceError;
pub use keygen::DefaultKeyGenerator;
pub use memory::{InMemoryDeviceRepository, InMemoryKeyStore, InMemorySignatureStore};
pub use service::{
    CreateDeviceInput, DeviceOperations, DeviceService, LoggedDeviceService, SignTransactionInput,
    SignatureResult,
};
pub use signer::DefaultSignerFactory;
pub use traits::{
    Clock, DeviceRepository, KeyGenerator, KeyStore, SignatureStore, Signer, SignerFactory,
    SystemClock,
};
pub use types::{build_signed_data, Algorithm, Device, KeyMaterial, SignatureRecord};

#[cfg(test)]
mod tests;
