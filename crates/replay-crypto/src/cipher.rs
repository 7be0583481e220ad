//! AES-CBC bulk decryption with NUL padding.
//!
//! # Ciphertext format
//!
//! ```text
//! <16-byte IV><AES-CBC body, a positive multiple of 16 bytes>
//! ```
//!
//! The body is padded with `0x00` up to the block boundary, not PKCS#7.
//! Trailing NUL bytes are stripped after decryption, so a plaintext that
//! genuinely ends in NUL loses those bytes. This matches the format written
//! by the log encryption side and is kept as-is for compatibility.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{
    block_padding::NoPadding, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};

use crate::error::{DecryptError, SealError};

/// AES block size, and therefore the IV length, in bytes.
pub const BLOCK_LEN: usize = 16;

/// Accepted AES key lengths: AES-128, AES-192 and AES-256.
pub const AES_KEY_LENS: [usize; 3] = [16, 24, 32];

/// Decrypt an IV-prefixed AES-CBC ciphertext and strip trailing NUL padding.
///
/// The AES variant is chosen from the key length.
///
/// # Errors
///
/// - [`DecryptError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
/// - [`DecryptError::TruncatedInput`] if `ciphertext` is shorter than the IV.
/// - [`DecryptError::InvalidCiphertextLength`] if the body after the IV is
///   empty or not a multiple of [`BLOCK_LEN`].
pub fn decrypt_cbc(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if !AES_KEY_LENS.contains(&key.len()) {
        return Err(DecryptError::InvalidKeyLength(key.len()));
    }
    if ciphertext.len() < BLOCK_LEN {
        return Err(DecryptError::TruncatedInput(ciphertext.len()));
    }
    let (iv, body) = ciphertext.split_at(BLOCK_LEN);
    if body.is_empty() || body.len() % BLOCK_LEN != 0 {
        return Err(DecryptError::InvalidCiphertextLength(body.len()));
    }

    let mut buf = body.to_vec();
    match key.len() {
        16 => decrypt_in_place::<Aes128>(key, iv, &mut buf)?,
        24 => decrypt_in_place::<Aes192>(key, iv, &mut buf)?,
        _ => decrypt_in_place::<Aes256>(key, iv, &mut buf)?,
    }

    strip_nul_padding(&mut buf);
    Ok(buf)
}

/// Encrypt `plaintext` with AES-CBC under `key` and `iv`, NUL-padding it to a
/// block boundary, and return `iv || body`.
///
/// An empty plaintext is padded to one full block so the body is never empty.
///
/// # Errors
///
/// Returns [`SealError::InvalidKeyLength`] if `key` is not 16, 24 or 32 bytes.
pub fn encrypt_cbc(key: &[u8], iv: &[u8; BLOCK_LEN], plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
    if !AES_KEY_LENS.contains(&key.len()) {
        return Err(SealError::InvalidKeyLength(key.len()));
    }

    let padded_len = match plaintext.len() {
        0 => BLOCK_LEN,
        n => n.div_ceil(BLOCK_LEN) * BLOCK_LEN,
    };
    let mut body = vec![0u8; padded_len];
    body[..plaintext.len()].copy_from_slice(plaintext);

    match key.len() {
        16 => encrypt_in_place::<Aes128>(key, iv, &mut body)?,
        24 => encrypt_in_place::<Aes192>(key, iv, &mut body)?,
        _ => encrypt_in_place::<Aes256>(key, iv, &mut body)?,
    }

    let mut out = Vec::with_capacity(BLOCK_LEN + body.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(&body);
    Ok(out)
}

fn decrypt_in_place<C>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), DecryptError>
where
    C: BlockCipher + BlockDecryptMut,
    cbc::Decryptor<C>: KeyIvInit + BlockDecryptMut,
{
    let len = buf.len();
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| DecryptError::InvalidKeyLength(key.len()))?
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| DecryptError::InvalidCiphertextLength(len))?;
    Ok(())
}

fn encrypt_in_place<C>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), SealError>
where
    C: BlockCipher + BlockEncryptMut,
    cbc::Encryptor<C>: KeyIvInit + BlockEncryptMut,
{
    let len = buf.len();
    cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| SealError::InvalidKeyLength(key.len()))?
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| SealError::InvalidKeyLength(key.len()))?;
    Ok(())
}

fn strip_nul_padding(buf: &mut Vec<u8>) {
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    buf.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV: [u8; BLOCK_LEN] = [0x24; BLOCK_LEN];

    fn key(len: usize) -> Vec<u8> {
        (0..len as u8).collect()
    }

    #[test]
    fn round_trip_all_key_sizes() {
        for len in AES_KEY_LENS {
            let k = key(len);
            let ct = encrypt_cbc(&k, &IV, b"replay chunk").unwrap();
            assert_eq!(decrypt_cbc(&k, &ct).unwrap(), b"replay chunk");
        }
    }

    #[test]
    fn round_trip_block_boundaries() {
        let k = key(32);
        for size in [1usize, 15, 16, 17, 31, 32, 33, 100] {
            let plaintext = vec![b'x'; size];
            let ct = encrypt_cbc(&k, &IV, &plaintext).unwrap();
            assert_eq!((ct.len() - BLOCK_LEN) % BLOCK_LEN, 0);
            assert_eq!(decrypt_cbc(&k, &ct).unwrap(), plaintext);
        }
    }

    #[test]
    fn empty_plaintext_encrypts_to_one_block() {
        let k = key(16);
        let ct = encrypt_cbc(&k, &IV, b"").unwrap();
        assert_eq!(ct.len(), 2 * BLOCK_LEN);
        assert!(decrypt_cbc(&k, &ct).unwrap().is_empty());
    }

    #[test]
    fn trailing_nul_in_plaintext_is_lost() {
        let k = key(16);
        let ct = encrypt_cbc(&k, &IV, b"abc\0\0").unwrap();
        assert_eq!(decrypt_cbc(&k, &ct).unwrap(), b"abc");
    }

    #[test]
    fn iv_is_prepended() {
        let ct = encrypt_cbc(&key(24), &IV, b"hello").unwrap();
        assert_eq!(&ct[..BLOCK_LEN], &IV);
    }

    #[test]
    fn rejects_invalid_key_lengths() {
        let ct = encrypt_cbc(&key(16), &IV, b"hello").unwrap();
        for len in [0usize, 15, 17, 23, 25, 31, 33] {
            assert!(matches!(
                decrypt_cbc(&key(len), &ct),
                Err(DecryptError::InvalidKeyLength(n)) if n == len
            ));
            assert!(matches!(
                encrypt_cbc(&key(len), &IV, b"hello"),
                Err(SealError::InvalidKeyLength(n)) if n == len
            ));
        }
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(matches!(
            decrypt_cbc(&key(16), &[0u8; 15]),
            Err(DecryptError::TruncatedInput(15))
        ));
        assert!(matches!(
            decrypt_cbc(&key(16), &[]),
            Err(DecryptError::TruncatedInput(0))
        ));
    }

    #[test]
    fn rejects_misaligned_or_empty_body() {
        assert!(matches!(
            decrypt_cbc(&key(16), &[0u8; 16]),
            Err(DecryptError::InvalidCiphertextLength(0))
        ));
        assert!(matches!(
            decrypt_cbc(&key(16), &[0u8; 33]),
            Err(DecryptError::InvalidCiphertextLength(17))
        ));
    }

    #[test]
    fn body_bit_flip_keeps_block_count() {
        let k = key(32);
        let plaintext = vec![b'a'; 48];
        let mut ct = encrypt_cbc(&k, &IV, &plaintext).unwrap();
        ct[BLOCK_LEN + 3] ^= 0x01;
        let mut raw = ct[BLOCK_LEN..].to_vec();
        decrypt_in_place::<Aes256>(&k, &ct[..BLOCK_LEN], &mut raw).unwrap();
        assert_eq!(raw.len(), plaintext.len());
        assert_ne!(raw, plaintext);
    }

    #[test]
    fn iv_bit_flip_changes_first_block_only() {
        let k = key(32);
        let plaintext = vec![b'a'; 32];
        let mut ct = encrypt_cbc(&k, &IV, &plaintext).unwrap();
        ct[0] ^= 0x01;
        let out = decrypt_cbc(&k, &ct).unwrap();
        assert_eq!(out.len(), plaintext.len());
        assert_eq!(out[0], b'a' ^ 0x01);
        assert_eq!(&out[1..], &plaintext[1..]);
    }
}
