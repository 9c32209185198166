//! Key derivation: PBKDF2-HMAC-SHA256 (shared secret, salt) → key material

use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::error::CryptoError;
use crate::{check_len, BLOCK_SIZE, KEY_MATERIAL_SIZE, KEY_SIZE};

/// An AES-128 key plus a 16-byte IV or counter seed, derived together.
///
/// Recomputed for every decode and zeroized on drop.
#[derive(Clone)]
pub struct KeyMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; BLOCK_SIZE],
}

impl KeyMaterial {
    /// Split 32 derived bytes into (key = first half, iv = second half).
    pub fn from_bytes(bytes: &[u8; KEY_MATERIAL_SIZE]) -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; BLOCK_SIZE];
        key.copy_from_slice(&bytes[..KEY_SIZE]);
        iv.copy_from_slice(&bytes[KEY_SIZE..]);
        Self { key, iv }
    }

    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// IV for the CBC layer, or initial counter for the stream layer.
    pub fn iv(&self) -> &[u8; BLOCK_SIZE] {
        &self.iv
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Derive `output_len` bytes from `secret` and `salt` with PBKDF2-HMAC-SHA256.
///
/// Deterministic for identical inputs.
pub fn derive(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::InvalidLength {
            what: "shared secret",
            expected: 1,
            actual: 0,
        });
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidIterations(iterations));
    }
    if output_len == 0 {
        return Err(CryptoError::InvalidLength {
            what: "derived output",
            expected: KEY_MATERIAL_SIZE,
            actual: 0,
        });
    }

    let mut out = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut out);
    Ok(out)
}

/// Derive the 32 bytes of key material one bundle layer needs.
///
/// The salt must be exactly one block long.
pub fn derive_key_material(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<KeyMaterial, CryptoError> {
    check_len("salt", salt, BLOCK_SIZE)?;

    let derived = derive(secret, salt, iterations, KEY_MATERIAL_SIZE)?;
    let mut bytes = [0u8; KEY_MATERIAL_SIZE];
    bytes.copy_from_slice(&derived);
    let material = KeyMaterial::from_bytes(&bytes);
    bytes.zeroize();

    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha256_known_answer() {
        // RFC 7914 section 11
        let out = derive(b"passwd", b"salt", 1, 64).unwrap();
        let expected: [u8; 64] = [
            0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f, 0xec, 0x16, 0x91, 0xc2, 0x25, 0x44,
            0xb6, 0x05, 0xf9, 0x41, 0x85, 0x21, 0x6d, 0xde, 0x04, 0x65, 0xe6, 0x8b, 0x9d, 0x57,
            0xc2, 0x0d, 0xac, 0xbc, 0x49, 0xca, 0x9c, 0xcc, 0xf1, 0x79, 0xb6, 0x45, 0x99, 0x16,
            0x64, 0xb3, 0x9d, 0x77, 0xef, 0x31, 0x7c, 0x71, 0xb8, 0x45, 0xb1, 0xe3, 0x0b, 0xd5,
            0x09, 0x11, 0x20, 0x41, 0xd3, 0xa1, 0x97, 0x83,
        ];
        assert_eq!(out.as_slice(), &expected);
    }

    #[test]
    fn test_derive_deterministic() {
        let salt = [7u8; 16];
        let a = derive_key_material(b"shared-secret", &salt, 100).unwrap();
        let b = derive_key_material(b"shared-secret", &salt, 100).unwrap();

        assert_eq!(a.key(), b.key(), "derivation must be deterministic");
        assert_eq!(a.iv(), b.iv());
    }

    #[test]
    fn test_key_material_is_split_in_halves() {
        let salt = [3u8; 16];
        let full = derive(b"shared-secret", &salt, 50, 32).unwrap();
        let material = derive_key_material(b"shared-secret", &salt, 50).unwrap();

        assert_eq!(&full[..16], material.key());
        assert_eq!(&full[16..], material.iv());
    }

    #[test]
    fn test_different_salts_different_material() {
        let a = derive_key_material(b"shared-secret", &[1u8; 16], 10).unwrap();
        let b = derive_key_material(b"shared-secret", &[2u8; 16], 10).unwrap();

        assert_ne!(a.key(), b.key(), "different salts must produce different keys");
    }

    #[test]
    fn test_salt_must_be_one_block() {
        let err = derive_key_material(b"shared-secret", &[0u8; 15], 10).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidLength {
                what: "salt",
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            derive(b"shared-secret", &[0u8; 16], 0, 32),
            Err(CryptoError::InvalidIterations(0))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let material = derive_key_material(b"shared-secret", &[9u8; 16], 10).unwrap();
        let debug = format!("{material:?}");
        assert!(debug.contains("REDACTED"));
    }
}
