//! RSASSA-PKCS1-v1_5 / SHA-256 signatures over the inner payload

use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// An RSA public key as raw big-endian modulus and exponent bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
}

impl From<&RsaPublicKey> for PublicKey {
    fn from(key: &RsaPublicKey) -> Self {
        Self {
            modulus: key.n().to_bytes_be(),
            exponent: key.e().to_bytes_be(),
        }
    }
}

/// Verifies payload signatures against one public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: RsaPublicKey,
}

impl SignatureVerifier {
    pub fn new(public_key: &PublicKey) -> Result<Self, CryptoError> {
        let key = RsaPublicKey::new(
            BigUint::from_bytes_be(&public_key.modulus),
            BigUint::from_bytes_be(&public_key.exponent),
        )
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Modulus size in bytes; valid signatures are exactly this long.
    pub fn size(&self) -> usize {
        self.key.size()
    }

    /// `true` only if `signature` is a valid signature of `payload`.
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(payload);
        match self
            .key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(signature_len = signature.len(), "signature rejected: {e}");
                false
            }
        }
    }
}

/// One-shot verification; a malformed public key also yields `false`.
pub fn verify(payload: &[u8], signature: &[u8], public_key: &PublicKey) -> bool {
    match SignatureVerifier::new(public_key) {
        Ok(verifier) => verifier.verify(payload, signature),
        Err(e) => {
            tracing::debug!("cannot verify: {e}");
            false
        }
    }
}

/// Sign `payload` the way bundle producers do.
pub fn sign(private_key: &RsaPrivateKey, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let digest = Sha256::digest(payload);
    private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn test_private_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("RSA key generation")
        })
    }

    fn test_public_key() -> PublicKey {
        PublicKey::from(&test_private_key().to_public_key())
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let payload = b"inner archive ciphertext";
        let signature = sign(test_private_key(), payload).unwrap();

        assert_eq!(signature.len(), 128);
        assert!(verify(payload, &signature, &test_public_key()));
    }

    #[test]
    fn test_every_single_bit_flip_rejected() {
        let payload = b"inner archive ciphertext";
        let signature = sign(test_private_key(), payload).unwrap();
        let verifier = SignatureVerifier::new(&test_public_key()).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    !verifier.verify(payload, &tampered),
                    "flipping bit {bit} of byte {byte} must invalidate the signature"
                );
            }
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signature = sign(test_private_key(), b"original").unwrap();
        assert!(!verify(b"0riginal", &signature, &test_public_key()));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let signature = sign(test_private_key(), b"payload").unwrap();
        assert!(!verify(b"payload", &signature[..64], &test_public_key()));
        assert!(!verify(b"payload", &[], &test_public_key()));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let other = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let signature = sign(&other, b"payload").unwrap();
        assert!(!verify(b"payload", &signature, &test_public_key()));
    }

    #[test]
    fn test_malformed_public_key() {
        let bad = PublicKey {
            modulus: test_public_key().modulus,
            exponent: vec![0x01],
        };
        assert!(SignatureVerifier::new(&bad).is_err());
        assert!(!verify(b"payload", &[0u8; 128], &bad));
    }

    #[test]
    fn test_public_key_bytes_roundtrip() {
        let parts = test_public_key();
        assert_eq!(parts.exponent, vec![0x01, 0x00, 0x01]);

        let verifier = SignatureVerifier::new(&parts).unwrap();
        assert_eq!(verifier.size(), 128);
    }
}
