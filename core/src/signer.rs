//! Crypto signers, resolved per device algorithm from stored key material.
//!
//! Parse failures surface as internal errors: the PEM blobs were produced by
//! our own generator and survived the key store.

use p256::ecdsa::signature::Signer as _;
use sec1::DecodeEcPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::errors::DeviceError;
use crate::traits::{Signer, SignerFactory};
use crate::types::{Algorithm, Device, KeyMaterial};

/// SHA-256 + PKCS#1 v1.5.
struct RsaSigner {
    key: rsa::pkcs1v15::SigningKey<Sha256>,
}

impl Signer for RsaSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        let signature = self
            .key
            .try_sign(data)
            .map_err(|e| DeviceError::internal(format!("rsa sign: {e}")))?;
        Ok(signature.to_vec())
    }
}

/// SHA-256 + ASN.1 DER encoded (r, s) on P-256.
struct EcdsaSigner {
    key: p256::ecdsa::SigningKey,
}

impl Signer for EcdsaSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DeviceError> {
        let signature: p256::ecdsa::Signature = self
            .key
            .try_sign(data)
            .map_err(|e| DeviceError::internal(format!("ecdsa sign: {e}")))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

/// Resolves signers from PEM key material.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSignerFactory;

impl DefaultSignerFactory {
    pub fn new() -> DefaultSignerFactory {
        DefaultSignerFactory
    }
}

impl SignerFactory for DefaultSignerFactory {
    fn signer_for(
        &self,
        device: &Device,
        material: &KeyMaterial,
    ) -> Result<Box<dyn Signer>, DeviceError> {
        match device.algorithm {
            Algorithm::Rsa => {
                let key = RsaPrivateKey::from_pkcs1_pem(pem_str(material.private())?)
                    .map_err(|e| DeviceError::internal(format!("decode rsa private key: {e}")))?;
                Ok(Box::new(RsaSigner {
                    key: rsa::pkcs1v15::SigningKey::<Sha256>::new(key),
                }))
            }
            Algorithm::Ecdsa => {
                let secret = p256::SecretKey::from_sec1_pem(pem_str(material.private())?)
                    .map_err(|e| DeviceError::internal(format!("decode ec private key: {e}")))?;
                Ok(Box::new(EcdsaSigner {
                    key: p256::ecdsa::SigningKey::from(secret),
                }))
            }
        }
    }
}

fn pem_str(bytes: &[u8]) -> Result<&str, DeviceError> {
    std::str::from_utf8(bytes).map_err(|_| DeviceError::internal("key material is not valid PEM"))
}
