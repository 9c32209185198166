use sdb_core::SdbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid iteration count: {0}")]
    InvalidIterations(u32),

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    Unaligned(usize),

    #[error("invalid padding (wrong key or corrupted input)")]
    BadPadding,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for SdbError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Unaligned(_) | CryptoError::BadPadding => {
                SdbError::Decryption(err.to_string())
            }
            CryptoError::Io(e) => SdbError::Io(e),
            CryptoError::InvalidLength { .. }
            | CryptoError::InvalidIterations(_)
            | CryptoError::InvalidPublicKey(_)
            | CryptoError::Signing(_) => SdbError::Configuration(err.to_string()),
        }
    }
}
