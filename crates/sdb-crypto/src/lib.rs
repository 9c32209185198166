//! sdb-crypto: the cryptographic layers of a static data bundle
//!
//! Bundle layout, outermost first:
//! ```text
//! AES-128-CBC/PKCS#7 (key material = PBKDF2(secret, layer_salt))
//!   └── outer archive
//!       ├── sign  RSASSA-PKCS1-v1_5 / SHA-256 over `data`
//!       └── data  AES-128 counter stream (key material = PBKDF2(secret, stream_salt))
//!           └── inner archive (table files)
//! ```
//!
//! Algorithms are fixed by the bundle format; nothing here is negotiable at
//! runtime.

pub mod cbc;
pub mod counter;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod signature;

pub use counter::{process, CounterReader, CounterStream};
pub use error::CryptoError;
pub use kdf::{derive, derive_key_material, KeyMaterial};
pub use keys::BundleKeys;
pub use signature::{PublicKey, SignatureVerifier};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// AES-128 key size in bytes
pub const KEY_SIZE: usize = 16;

/// PBKDF2 output: key followed by IV / counter seed
pub const KEY_MATERIAL_SIZE: usize = KEY_SIZE + BLOCK_SIZE;

/// PBKDF2 iterations used by the bundle format
pub const DEFAULT_ITERATIONS: u32 = 10_000;

pub(crate) fn check_len(what: &'static str, bytes: &[u8], expected: usize) -> Result<(), CryptoError> {
    if bytes.len() != expected {
        return Err(CryptoError::InvalidLength {
            what,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}
