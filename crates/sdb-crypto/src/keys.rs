//! Key inputs for decoding a bundle: embedded constants plus per-deployment salts

use sdb_core::config::{BundleConfig, SALT_SIZE};
use sdb_core::SdbResult;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::{derive_key_material, KeyMaterial};
use crate::signature::PublicKey;
use crate::DEFAULT_ITERATIONS;

/// Shared secret fed to PBKDF2 for both layers
pub const SHARED_SECRET: [u8; 64] = [
    0xCB, 0xC2, 0x1C, 0x6F, 0xF3, 0xF5, 0x07, 0xF5, 0x05, 0xBA, 0xCA, 0xD4,
    0x98, 0x28, 0x84, 0x1F, 0xF0, 0xD1, 0x38, 0xC7, 0x61, 0xDF, 0xD6, 0xE6,
    0x64, 0x9A, 0x85, 0x13, 0x3E, 0x1A, 0x6A, 0x0C, 0x68, 0x0E, 0x2B, 0xC4,
    0xDF, 0x72, 0xF8, 0xC6, 0x55, 0xE4, 0x7B, 0x14, 0x36, 0x18, 0x3B, 0xA7,
    0xD1, 0x20, 0x81, 0x22, 0xD1, 0xA9, 0x18, 0x84, 0x65, 0x13, 0x0B, 0xED,
    0xA3, 0x00, 0xE5, 0xD9,
];

/// Big-endian modulus of the bundle signing key (RSA-2048)
pub const SIGNING_MODULUS: [u8; 256] = [
    0x89, 0xD6, 0x66, 0x00, 0x7D, 0xFC, 0x7D, 0xCE, 0x83, 0xA6, 0x62, 0xE3,
    0x1A, 0x5E, 0x9A, 0x53, 0xC7, 0x8A, 0x27, 0xF3, 0x67, 0xC1, 0xF3, 0xD4,
    0x37, 0xFE, 0x50, 0x6D, 0x38, 0x45, 0xDF, 0x7E, 0x73, 0x5C, 0xF4, 0x9D,
    0x40, 0x4C, 0x8C, 0x63, 0x21, 0x97, 0xDF, 0x46, 0xFF, 0xB2, 0x0D, 0x0E,
    0xDB, 0xB2, 0x72, 0xB4, 0xA8, 0x42, 0xCD, 0xEE, 0x48, 0x06, 0x74, 0x4F,
    0xE9, 0x56, 0x6E, 0x9A, 0xB1, 0x60, 0x18, 0xBC, 0x86, 0x0B, 0xB6, 0x32,
    0xA7, 0x51, 0x00, 0x85, 0x7B, 0xC8, 0x72, 0xCE, 0x53, 0x71, 0x3F, 0x64,
    0xC2, 0x25, 0x58, 0xEF, 0xB0, 0xC9, 0x1D, 0xE3, 0xB3, 0x8E, 0xFC, 0x55,
    0xCF, 0x8B, 0x02, 0xA5, 0xC8, 0x1E, 0xA7, 0x0E, 0x26, 0x59, 0xA8, 0x33,
    0xA5, 0xF1, 0x11, 0xDB, 0xCB, 0xD3, 0xA7, 0x1F, 0xB1, 0xC6, 0x10, 0x39,
    0xC8, 0x31, 0x1D, 0x60, 0xDB, 0x0D, 0xA4, 0x13, 0x4B, 0x2B, 0x0E, 0xF3,
    0x6F, 0x69, 0xCB, 0xA8, 0x62, 0x03, 0x69, 0xE6, 0x95, 0x6B, 0x8D, 0x11,
    0xF6, 0xAF, 0xD9, 0xC2, 0x27, 0x3A, 0x32, 0x12, 0x05, 0xC3, 0xB1, 0xE2,
    0x81, 0x4B, 0x40, 0xF8, 0x8B, 0x8D, 0xBA, 0x1F, 0x55, 0x60, 0x2C, 0x09,
    0xC6, 0xED, 0x73, 0x96, 0x32, 0xAF, 0x5F, 0xEE, 0x8F, 0xEB, 0x5B, 0x93,
    0xCF, 0x73, 0x13, 0x15, 0x6B, 0x92, 0x7B, 0x27, 0x0A, 0x13, 0xF0, 0x03,
    0x4D, 0x6F, 0x5E, 0x40, 0x7B, 0x9B, 0xD5, 0xCE, 0xFC, 0x04, 0x97, 0x7E,
    0xAA, 0xA3, 0x53, 0x2A, 0xCF, 0xD2, 0xD5, 0xCF, 0x52, 0xB2, 0x40, 0x61,
    0x28, 0xB1, 0xA6, 0xF6, 0x78, 0xFB, 0x69, 0x9A, 0x85, 0xD6, 0xB9, 0x13,
    0x14, 0x6D, 0xC4, 0x25, 0x36, 0x17, 0xDB, 0x54, 0x0C, 0xD8, 0x77, 0x80,
    0x9A, 0x00, 0x62, 0x83, 0xDD, 0xB0, 0x06, 0x64, 0xD0, 0x81, 0x5B, 0x0D,
    0x23, 0x9E, 0x88, 0xBD,
];

/// Public exponent of the bundle signing key
pub const SIGNING_EXPONENT: [u8; 3] = [0x01, 0x00, 0x01];

/// Everything needed to unwrap a bundle besides the bundle itself.
///
/// The secret is zeroized on drop.
#[derive(Clone)]
pub struct BundleKeys {
    secret: Vec<u8>,
    layer_salt: [u8; SALT_SIZE],
    stream_salt: [u8; SALT_SIZE],
    iterations: u32,
    public_key: PublicKey,
}

impl BundleKeys {
    pub fn new(
        secret: Vec<u8>,
        layer_salt: [u8; SALT_SIZE],
        stream_salt: [u8; SALT_SIZE],
        iterations: u32,
        public_key: PublicKey,
    ) -> Self {
        Self {
            secret,
            layer_salt,
            stream_salt,
            iterations,
            public_key,
        }
    }

    /// Embedded secret and signing key with the given salts.
    pub fn with_salts(layer_salt: [u8; SALT_SIZE], stream_salt: [u8; SALT_SIZE]) -> Self {
        Self::new(
            SHARED_SECRET.to_vec(),
            layer_salt,
            stream_salt,
            DEFAULT_ITERATIONS,
            embedded_public_key(),
        )
    }

    /// Resolve the bundle section of the config, falling back to the
    /// embedded constants for anything not overridden.
    pub fn from_config(config: &BundleConfig) -> SdbResult<Self> {
        let layer_salt = config.layer_salt_bytes()?;
        let stream_salt = config.stream_salt_bytes()?;
        let secret = config
            .secret_bytes()?
            .unwrap_or_else(|| SHARED_SECRET.to_vec());
        let public_key = PublicKey {
            modulus: config
                .modulus_bytes()?
                .unwrap_or_else(|| SIGNING_MODULUS.to_vec()),
            exponent: config
                .exponent_bytes()?
                .unwrap_or_else(|| SIGNING_EXPONENT.to_vec()),
        };

        Ok(Self::new(
            secret,
            layer_salt,
            stream_salt,
            config.kdf_iterations,
            public_key,
        ))
    }

    /// Key and IV for the outer CBC layer.
    pub fn layer_material(&self) -> Result<KeyMaterial, CryptoError> {
        derive_key_material(&self.secret, &self.layer_salt, self.iterations)
    }

    /// Key and counter seed for the inner stream layer.
    pub fn stream_material(&self) -> Result<KeyMaterial, CryptoError> {
        derive_key_material(&self.secret, &self.stream_salt, self.iterations)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Drop for BundleKeys {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for BundleKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleKeys")
            .field("secret", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .field("modulus_bytes", &self.public_key.modulus.len())
            .finish()
    }
}

/// The public key bundle producers sign with.
pub fn embedded_public_key() -> PublicKey {
    PublicKey {
        modulus: SIGNING_MODULUS.to_vec(),
        exponent: SIGNING_EXPONENT.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::SignatureVerifier;
    use sdb_core::SdbError;

    #[test]
    fn test_embedded_public_key_is_valid_rsa_2048() {
        let verifier = SignatureVerifier::new(&embedded_public_key()).unwrap();
        assert_eq!(verifier.size(), 256);
    }

    #[test]
    fn test_layer_and_stream_material_differ() {
        let keys = BundleKeys::new(b"secret".to_vec(), [1u8; 16], [2u8; 16], 10, embedded_public_key());

        let layer = keys.layer_material().unwrap();
        let stream = keys.stream_material().unwrap();
        assert_ne!(layer.key(), stream.key());
        assert_ne!(layer.iv(), stream.iv());
    }

    #[test]
    fn test_from_config_uses_embedded_defaults() {
        let config = BundleConfig {
            layer_salt: "AAECAwQFBgcICQoLDA0ODw==".into(),
            stream_salt: "EBESExQVFhcYGRobHB0eHw==".into(),
            ..Default::default()
        };
        let keys = BundleKeys::from_config(&config).unwrap();

        assert_eq!(keys.public_key(), &embedded_public_key());
        assert_eq!(keys.iterations(), DEFAULT_ITERATIONS);
        assert_eq!(keys.secret, SHARED_SECRET.to_vec());
    }

    #[test]
    fn test_from_config_requires_salts() {
        let err = BundleKeys::from_config(&BundleConfig::default()).unwrap_err();
        assert!(matches!(err, SdbError::Configuration(_)));
    }

    #[test]
    fn test_debug_is_redacted() {
        let keys = BundleKeys::with_salts([0u8; 16], [0u8; 16]);
        let debug = format!("{keys:?}");
        assert!(debug.contains("REDACTED"));
    }
}
