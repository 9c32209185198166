//! Inner bundle layer: AES-128 counter stream
//!
//! Keystream block `i` is `AES-128-ECB(key, seed + i)` where the counter is a
//! 16-byte big-endian integer that wraps to zero after `0xFF..FF`. Data is
//! XORed with the keystream one byte at a time, so the same transform both
//! encrypts and decrypts and input of any length can be streamed.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Block};
use std::io::{self, Read, Write};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::{check_len, BLOCK_SIZE, KEY_SIZE};

/// Incremental keystream state.
pub struct CounterStream {
    cipher: Aes128,
    counter: [u8; BLOCK_SIZE],
    keystream: [u8; BLOCK_SIZE],
    /// Bytes of `keystream` already consumed; `BLOCK_SIZE` means exhausted
    used: usize,
}

impl CounterStream {
    pub fn new(key: &[u8], counter_seed: &[u8]) -> Result<Self, CryptoError> {
        check_len("key", key, KEY_SIZE)?;
        check_len("counter seed", counter_seed, BLOCK_SIZE)?;

        let cipher = Aes128::new_from_slice(key).map_err(|_| CryptoError::InvalidLength {
            what: "key",
            expected: KEY_SIZE,
            actual: key.len(),
        })?;

        let mut counter = [0u8; BLOCK_SIZE];
        counter.copy_from_slice(counter_seed);

        Ok(Self {
            cipher,
            counter,
            keystream: [0u8; BLOCK_SIZE],
            used: BLOCK_SIZE,
        })
    }

    /// XOR `buf` in place with the next `buf.len()` keystream bytes.
    pub fn apply(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            if self.used == BLOCK_SIZE {
                self.refill();
            }
            *byte ^= self.keystream[self.used];
            self.used += 1;
        }
    }

    /// The counter value the next keystream block will be generated from.
    pub fn counter(&self) -> &[u8; BLOCK_SIZE] {
        &self.counter
    }

    fn refill(&mut self) {
        let mut block = Block::clone_from_slice(&self.counter);
        self.cipher.encrypt_block(&mut block);
        self.keystream.copy_from_slice(&block);
        increment_counter(&mut self.counter);
        self.used = 0;
    }
}

impl Drop for CounterStream {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.keystream.zeroize();
    }
}

impl std::fmt::Debug for CounterStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterStream")
            .field("counter", &"[REDACTED]")
            .field("used", &self.used)
            .finish()
    }
}

/// Add one to a big-endian 128-bit counter, wrapping `0xFF..FF` to zero.
pub fn increment_counter(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Transform a whole buffer. Applying it twice with the same inputs is the
/// identity.
pub fn process(data: &[u8], key: &[u8], counter_seed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut stream = CounterStream::new(key, counter_seed)?;
    let mut out = data.to_vec();
    stream.apply(&mut out);
    Ok(out)
}

/// Transform everything `reader` yields into `writer` without buffering
/// the whole input. Returns the number of bytes written.
pub fn process_stream<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    key: &[u8],
    counter_seed: &[u8],
) -> Result<u64, CryptoError> {
    let mut reader = CounterReader::new(reader, key, counter_seed)?;
    let written = io::copy(&mut reader, writer)?;
    Ok(written)
}

/// A [`Read`] adapter that applies the counter stream to everything read
/// through it.
#[derive(Debug)]
pub struct CounterReader<R> {
    inner: R,
    stream: CounterStream,
}

impl<R: Read> CounterReader<R> {
    pub fn new(inner: R, key: &[u8], counter_seed: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            inner,
            stream: CounterStream::new(key, counter_seed)?,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for CounterReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.stream.apply(&mut buf[..n]);
        Ok(n)
    }
}
