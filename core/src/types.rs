use std::fmt;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::DeviceError;

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Rsa,
    Ecdsa,
}

impl Algorithm {
    /// Parse an external identifier. Case-insensitive and whitespace-tolerant;
    /// anything other than RSA or ECDSA is a validation error.
    pub fn parse(value: &str) -> Result<Algorithm, DeviceError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "RSA" => Ok(Algorithm::Rsa),
            "ECDSA" => Ok(Algorithm::Ecdsa),
            _ => Err(DeviceError::invalid_algorithm()),
        }
    }

    /// Canonical uppercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Rsa => "RSA",
            Algorithm::Ecdsa => "ECDSA",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signature device managed by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: Uuid,
    pub algorithm: Algorithm,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Copy of the device with an updated label and timestamp.
    pub fn with_label(&self, label: impl Into<String>, at: DateTime<Utc>) -> Device {
        Device {
            label: label.into(),
            updated_at: at,
            ..self.clone()
        }
    }
}

/// Serialized (PEM armored) key pair for a device.
///
/// The private half never leaves this crate: only the signer factory reads
/// it. Both halves are wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    public: Vec<u8>,
    private: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(public: Vec<u8>, private: Vec<u8>) -> KeyMaterial {
        KeyMaterial { public, private }
    }

    /// PEM encoded public key.
    pub fn public(&self) -> &[u8] {
        &self.public
    }

    /// PEM encoded private key.
    pub(crate) fn private(&self) -> &[u8] {
        &self.private
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_len", &self.public.len())
            .field("private", &"[redacted]")
            .finish()
    }
}

/// A stored signature with its position in the device's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    /// Position in the chain, 1-indexed, dense, assigned on append.
    pub counter: u64,
    /// Base64 (standard, padded) signature bytes.
    pub signature: String,
    /// The exact string that was signed.
    pub signed_data: String,
    pub created_at: DateTime<Utc>,
}

/// Compose the exact string submitted to the signer:
/// `{counter}_{data}_{base64(reference)}`.
///
/// `data` is inserted verbatim; the reference is the previous signature's raw
/// bytes, or the 16 raw device id bytes for the first signature.
pub fn build_signed_data(counter: u64, data: &str, reference: &[u8]) -> String {
    format!("{}_{}_{}", counter, data, B64.encode(reference))
}
