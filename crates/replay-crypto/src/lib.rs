//! Hybrid decryption of encrypted query bodies and replay chunks.
//!
//! This crate is intentionally free of I/O beyond reading a key file, and of
//! any runtime or logging dependencies. Encrypted log data arrives as:
//!
//! ```text
//! wrapped key : base64(RSA-OAEP-SHA256(aes_key))
//! ciphertext  : <16-byte IV><AES-CBC(NUL-padded plaintext)>
//! ```
//!
//! [`decrypt`] reverses that; [`seal`] produces it.

pub mod cipher;
pub mod error;
pub mod hybrid;
pub mod keys;
pub mod keywrap;

pub use cipher::BLOCK_LEN;
pub use error::{DecryptError, KeyError, SealError, Stage};
pub use hybrid::{decrypt, generate_session_key, seal, HybridDecryptor, SessionKey};
pub use keys::{generate_private_key, load_private_key, parse_private_key_pem};
pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Shared RSA key pairs for unit tests. Generated once per test binary.
#[cfg(test)]
pub(crate) mod test_keys {
    use rsa::RsaPrivateKey;
    use std::sync::OnceLock;

    use crate::keys::generate_private_key;

    static TEST_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    static OTHER_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

    pub fn test_key() -> &'static RsaPrivateKey {
        TEST_KEY.get_or_init(|| generate_private_key(2048).unwrap())
    }

    pub fn other_key() -> &'static RsaPrivateKey {
        OTHER_KEY.get_or_init(|| generate_private_key(2048).unwrap())
    }
}
