//! Outer bundle layer: AES-128-CBC with PKCS#7 padding
//!
//! Unauthenticated. Padding is the only self-check at this layer; the RSA
//! signature over the next layer's payload is what establishes authenticity.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::CryptoError;
use crate::{check_len, BLOCK_SIZE, KEY_SIZE};

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// Decrypt and unpad `ciphertext`.
///
/// Fails with [`CryptoError::Unaligned`] if the input is empty or not a
/// multiple of 16 bytes, and with [`CryptoError::BadPadding`] if the final
/// block does not unpad (wrong key or corrupted input).
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_len("key", key, KEY_SIZE)?;
    check_len("iv", iv, BLOCK_SIZE)?;
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Unaligned(ciphertext.len()));
    }

    let decryptor = Aes128CbcDec::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength {
        what: "key",
        expected: KEY_SIZE,
        actual: key.len(),
    })?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::BadPadding)
}

/// Pad and encrypt `plaintext`. Output is always a positive multiple of 16 bytes.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_len("key", key, KEY_SIZE)?;
    check_len("iv", iv, BLOCK_SIZE)?;

    let encryptor = Aes128CbcEnc::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength {
        what: "key",
        expected: KEY_SIZE,
        actual: key.len(),
    })?;

    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}
