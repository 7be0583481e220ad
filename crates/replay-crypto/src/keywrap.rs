//! RSA-OAEP wrapping of the per-query symmetric key.
//!
//! Wrap format: RSA-OAEP, SHA-256 as both the hash and the MGF1 hash, no
//! label. The wrapped key travels as standard base64 with padding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::rand_core::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{DecryptError, SealError};

/// Base64-decode and RSA-OAEP-unwrap a symmetric key.
///
/// The private-key operation is blinded with a fresh random factor on each
/// call; the output depends only on the inputs. The returned buffer is wiped
/// when dropped.
///
/// # Errors
///
/// Returns [`DecryptError::Decode`] for invalid base64 and
/// [`DecryptError::Unwrap`] when OAEP decryption fails.
pub fn unwrap_key(
    private_key: &RsaPrivateKey,
    wrapped_key_b64: &str,
) -> Result<Zeroizing<Vec<u8>>, DecryptError> {
    let wrapped = STANDARD.decode(wrapped_key_b64)?;
    let key = private_key
        .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), &wrapped)
        .map_err(DecryptError::Unwrap)?;
    Ok(Zeroizing::new(key))
}

/// RSA-OAEP-wrap a symmetric key and base64-encode the result.
///
/// # Errors
///
/// Returns [`SealError::Wrap`] if the key is too long for the modulus.
pub fn wrap_key(public_key: &RsaPublicKey, key: &[u8]) -> Result<String, SealError> {
    let wrapped = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key)
        .map_err(SealError::Wrap)?;
    Ok(STANDARD.encode(wrapped))
}
