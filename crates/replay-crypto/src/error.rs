//! Error types for the hybrid decryption pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::cipher::BLOCK_LEN;

/// Stage of the hybrid-decrypt pipeline at which a failure occurred.
///
/// Each stage has a different operational remedy, so callers report the
/// stage alongside the error rather than a bare "decryption failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Base64 transport decoding of the wrapped key or exported ciphertext.
    Decode,
    /// RSA-OAEP unwrap of the symmetric key.
    Unwrap,
    /// Construction of the AES cipher from the unwrapped key.
    CipherInit,
    /// AES-CBC decryption of the ciphertext body.
    Decrypt,
}

impl Stage {
    /// Short machine-readable stage name, suitable for a log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::Unwrap => "unwrap",
            Stage::CipherInit => "cipher_init",
            Stage::Decrypt => "decrypt",
        }
    }

    /// Operator-facing remedy for a failure at this stage.
    pub fn remedy(&self) -> &'static str {
        match self {
            Stage::Decode => "check the base64 transport encoding of the exported data",
            Stage::Unwrap => "verify the configured private key matches the log encryption key",
            Stage::CipherInit => "the unwrapped key is not an AES key; verify the key pairing",
            Stage::Decrypt => "the replay log is unreadable; re-export the data",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while decrypting a wrapped key + ciphertext pair.
///
/// Variants never carry key material or plaintext.
#[derive(Debug, Error)]
pub enum DecryptError {
    /// The wrapped key (or other transport field) is not valid standard base64.
    #[error("input is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// RSA-OAEP rejected the wrapped key: wrong private key, corrupted or
    /// tampered data, or a length that does not match the modulus.
    #[error("symmetric key unwrap failed: {0}")]
    Unwrap(#[source] rsa::Error),

    /// The unwrapped key is not 16, 24 or 32 bytes long.
    #[error("unwrapped key has invalid AES length: {0} bytes")]
    InvalidKeyLength(usize),

    /// The ciphertext is shorter than one IV block.
    #[error("ciphertext is smaller than AES block size {BLOCK_LEN}: {0} bytes")]
    TruncatedInput(usize),

    /// The ciphertext body (after the IV) is empty or not block-aligned.
    #[error("ciphertext body must be a positive multiple of {BLOCK_LEN} bytes, got {0}")]
    InvalidCiphertextLength(usize),

    /// The decrypted plaintext is not valid UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DecryptError {
    /// The pipeline stage this failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            DecryptError::Decode(_) => Stage::Decode,
            DecryptError::Unwrap(_) => Stage::Unwrap,
            DecryptError::InvalidKeyLength(_) => Stage::CipherInit,
            DecryptError::TruncatedInput(_)
            | DecryptError::InvalidCiphertextLength(_)
            | DecryptError::Utf8(_) => Stage::Decrypt,
        }
    }
}

/// Errors produced while producing a wrapped key + ciphertext pair.
#[derive(Debug, Error)]
pub enum SealError {
    /// The AES key is not 16, 24 or 32 bytes long.
    #[error("invalid AES key length: {0} bytes")]
    InvalidKeyLength(usize),

    /// RSA-OAEP wrapping of the symmetric key failed.
    #[error("symmetric key wrap failed: {0}")]
    Wrap(#[source] rsa::Error),
}

/// Errors produced while loading an RSA private key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("failed to read private key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is neither a PKCS#1 nor a PKCS#8 PEM RSA private key.
    #[error("invalid RSA private key PEM: {0}")]
    Pem(String),

    /// Key pair generation failed.
    #[error("RSA key generation failed: {0}")]
    Generate(#[source] rsa::Error),
}
