//! Key pair generation. Produces PEM armored material: PKCS#1 for RSA,
//! SEC1 (private) plus SPKI (public) for ECDSA on P-256.

use sec1::EncodeEcPrivateKey;
use p256::pkcs8::EncodePublicKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::errors::DeviceError;
use crate::traits::KeyGenerator;
use crate::types::{Algorithm, KeyMaterial};

const RSA_BITS: usize = 2048;

/// Generates key material from the platform RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultKeyGenerator;

impl DefaultKeyGenerator {
    pub fn new() -> DefaultKeyGenerator {
        DefaultKeyGenerator
    }

    fn generate_rsa(&self) -> Result<KeyMaterial, DeviceError> {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, RSA_BITS)
            .map_err(|e| DeviceError::internal(format!("generate rsa key pair: {e}")))?;
        let public = RsaPublicKey::from(&private);

        let private_pem = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| DeviceError::internal(format!("encode rsa private key: {e}")))?;
        let public_pem = public
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| DeviceError::internal(format!("encode rsa public key: {e}")))?;

        Ok(KeyMaterial::new(
            public_pem.into_bytes(),
            private_pem.as_bytes().to_vec(),
        ))
    }

    fn generate_ecdsa(&self) -> Result<KeyMaterial, DeviceError> {
        let private = p256::SecretKey::random(&mut rand::rngs::OsRng);

        let private_pem = private
            .to_sec1_pem(p256::pkcs8::LineEnding::LF)
            .map_err(|e| DeviceError::internal(format!("encode ec private key: {e}")))?;
        let public_pem = private
            .public_key()
            .to_public_key_pem(p256::pkcs8::LineEnding::LF)
            .map_err(|e| DeviceError::internal(format!("encode ec public key: {e}")))?;

        Ok(KeyMaterial::new(
            public_pem.into_bytes(),
            private_pem.as_bytes().to_vec(),
        ))
    }
}

impl KeyGenerator for DefaultKeyGenerator {
    fn generate(&self, algorithm: Algorithm) -> Result<KeyMaterial, DeviceError> {
        match algorithm {
            Algorithm::Rsa => self.generate_rsa(),
            Algorithm::Ecdsa => self.generate_ecdsa(),
        }
    }
}
