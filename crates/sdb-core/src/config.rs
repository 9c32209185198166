use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{SdbError, SdbResult};

/// Salt length expected by both derivations (one AES block)
pub const SALT_SIZE: usize = 16;

/// Top-level configuration (loaded from sdb.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SdbConfig {
    pub bundle: BundleConfig,
    pub ingest: IngestConfig,
    pub log: LogConfig,
}

impl SdbConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml(toml_str: &str) -> SdbResult<Self> {
        toml::from_str(toml_str).map_err(|e| SdbError::Configuration(format!("parsing config: {e}")))
    }

    /// Load from `path`, or use defaults when the file does not exist.
    pub fn load(path: &Path) -> SdbResult<Self> {
        match Self::read(path)? {
            Some(config) => Ok(config),
            None => {
                tracing::warn!("config file not found: {}  (using defaults)", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Load from `path` without logging; `None` when the file does not exist.
    pub fn read(path: &Path) -> SdbResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map(Some)
    }
}

/// Where the bundle lives and the per-deployment key inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Location handed to the bundle source (path or URL)
    pub location: String,
    /// Base64 salt for the outer block cipher layer
    pub layer_salt: String,
    /// Base64 salt for the inner counter stream layer
    pub stream_salt: String,
    /// PBKDF2 iteration count (default: 10000)
    pub kdf_iterations: u32,
    /// Base64 override for the embedded shared secret
    pub secret: Option<String>,
    /// Base64 override for the embedded RSA modulus (big-endian)
    pub public_key_modulus: Option<String>,
    /// Base64 override for the embedded RSA exponent (big-endian)
    pub public_key_exponent: Option<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            location: "static-data.bin".into(),
            layer_salt: String::new(),
            stream_salt: String::new(),
            kdf_iterations: 10_000,
            secret: None,
            public_key_modulus: None,
            public_key_exponent: None,
        }
    }
}

impl BundleConfig {
    pub fn layer_salt_bytes(&self) -> SdbResult<[u8; SALT_SIZE]> {
        decode_salt("layer_salt", &self.layer_salt)
    }

    pub fn stream_salt_bytes(&self) -> SdbResult<[u8; SALT_SIZE]> {
        decode_salt("stream_salt", &self.stream_salt)
    }

    pub fn secret_bytes(&self) -> SdbResult<Option<Vec<u8>>> {
        self.secret
            .as_deref()
            .map(|s| decode_base64("secret", s))
            .transpose()
    }

    pub fn modulus_bytes(&self) -> SdbResult<Option<Vec<u8>>> {
        self.public_key_modulus
            .as_deref()
            .map(|s| decode_base64("public_key_modulus", s))
            .transpose()
    }

    pub fn exponent_bytes(&self) -> SdbResult<Option<Vec<u8>>> {
        self.public_key_exponent
            .as_deref()
            .map(|s| decode_base64("public_key_exponent", s))
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Concurrent table ingestions (0 = available parallelism)
    pub workers: usize,
    /// Overall initialization timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            timeout_secs: 300,
        }
    }
}

impl IngestConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

fn decode_base64(field: &str, value: &str) -> SdbResult<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| SdbError::Configuration(format!("{field} is not valid base64: {e}")))
}

fn decode_salt(field: &str, value: &str) -> SdbResult<[u8; SALT_SIZE]> {
    let bytes = decode_base64(field, value)?;
    bytes.as_slice().try_into().map_err(|_| {
        SdbError::Configuration(format!(
            "{field} must decode to {SALT_SIZE} bytes (got {})",
            bytes.len()
        ))
    })
}
