//! Hybrid decryption: RSA-OAEP key unwrap followed by AES-CBC bulk decrypt.

use std::fmt;
use std::sync::Arc;

use rsa::rand_core::{OsRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::cipher::{self, BLOCK_LEN};
use crate::error::{DecryptError, SealError};
use crate::keywrap;

/// Recover the plaintext protected by a wrapped key + ciphertext pair.
///
/// 1. Base64-decode and RSA-OAEP(SHA-256) unwrap `wrapped_key_b64`.
/// 2. Use the unwrapped bytes as an AES-128/192/256 key (chosen by length).
/// 3. Split `ciphertext` into a 16-byte IV and the CBC body, decrypt, and
///    strip trailing NUL padding.
///
/// Pure and deterministic; the private key is only read.
///
/// # Errors
///
/// Each stage fails with its own [`DecryptError`] variant; see
/// [`DecryptError::stage`].
pub fn decrypt(
    private_key: &RsaPrivateKey,
    wrapped_key_b64: &str,
    ciphertext: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    let key = keywrap::unwrap_key(private_key, wrapped_key_b64)?;
    cipher::decrypt_cbc(&key, ciphertext)
}

/// Inverse of [`decrypt`]: encrypt `plaintext` under `aes_key` and `iv`, then
/// wrap `aes_key` for `public_key`.
///
/// Returns `(wrapped_key_b64, iv || body)`.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] for a bad AES key and
/// [`SealError::Wrap`] if RSA-OAEP wrapping fails.
pub fn seal(
    public_key: &RsaPublicKey,
    aes_key: &[u8],
    iv: &[u8; BLOCK_LEN],
    plaintext: &[u8],
) -> Result<(String, Vec<u8>), SealError> {
    let ciphertext = cipher::encrypt_cbc(aes_key, iv, plaintext)?;
    let wrapped = keywrap::wrap_key(public_key, aes_key)?;
    Ok((wrapped, ciphertext))
}

/// A random AES key and IV for one sealing session.
pub struct SessionKey {
    pub key: Zeroizing<Vec<u8>>,
    pub iv: [u8; BLOCK_LEN],
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED; {}])", self.key.len())
    }
}

/// Generate a random AES key of `key_len` bytes and a random IV from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] if `key_len` is not 16, 24 or 32.
pub fn generate_session_key(key_len: usize) -> Result<SessionKey, SealError> {
    if !cipher::AES_KEY_LENS.contains(&key_len) {
        return Err(SealError::InvalidKeyLength(key_len));
    }
    let mut key = Zeroizing::new(vec![0u8; key_len]);
    OsRng.fill_bytes(&mut key);
    let mut iv = [0u8; BLOCK_LEN];
    OsRng.fill_bytes(&mut iv);
    Ok(SessionKey { key, iv })
}

/// Cloneable, thread-safe handle that decrypts with one private key.
///
/// The key sits behind an `Arc` and is never mutated, so clones can be used
/// concurrently from any number of threads or tasks.
#[derive(Clone)]
pub struct HybridDecryptor {
    key: Arc<RsaPrivateKey>,
}

impl HybridDecryptor {
    /// Wrap an owned private key.
    pub fn new(key: RsaPrivateKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Public half of the configured key pair.
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// See [`decrypt`].
    pub fn decrypt(&self, wrapped_key_b64: &str, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
        decrypt(&self.key, wrapped_key_b64, ciphertext)
    }

    /// Decrypt and interpret the plaintext as UTF-8 text (typically JSON).
    ///
    /// # Errors
    ///
    /// As [`decrypt`], plus [`DecryptError::Utf8`] for non-UTF-8 plaintext.
    pub fn decrypt_to_string(
        &self,
        wrapped_key_b64: &str,
        ciphertext: &[u8],
    ) -> Result<String, DecryptError> {
        Ok(String::from_utf8(self.decrypt(wrapped_key_b64, ciphertext)?)?)
    }
}

impl fmt::Debug for HybridDecryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HybridDecryptor([REDACTED])")
    }
}
