//! Signing and encryption transforms shared by the secure frame kinds.
//!
//! The encrypted frame uses the shared token as the AES key and its first
//! 16 bytes as the CBC IV. The IV is therefore fixed per token. Changing that
//! breaks wire compatibility with deployed clients, so it is kept as is.

use crate::constants::{AES_BLOCK_SIZE, SIGN_LEN};
use crate::frame::CryptoError;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Lowercase hex of `md5(token || body)`, always 32 ASCII bytes.
pub fn sign_digest(token: &[u8], body: &[u8]) -> [u8; SIGN_LEN] {
    let mut hasher = Md5::new();
    hasher.update(token);
    hasher.update(body);
    let digest = hasher.finalize();

    let mut sign = [0u8; SIGN_LEN];
    sign.copy_from_slice(hex::encode(digest).as_bytes());
    sign
}

/// Encrypts `plain` with AES-CBC + PKCS7 and returns the base64 text.
///
/// The key length selects AES-128/192/256. Any other length is reported as
/// [`CryptoError::InvalidKeyLength`].
pub fn aes_encrypt(plain: &[u8], token: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let iv = cbc_iv(token)?;

    let encrypted = match token.len() {
        16 => Aes128CbcEnc::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .encrypt_padded_vec_mut::<Pkcs7>(plain),
        24 => Aes192CbcEnc::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .encrypt_padded_vec_mut::<Pkcs7>(plain),
        32 => Aes256CbcEnc::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .encrypt_padded_vec_mut::<Pkcs7>(plain),
        _ => return Err(invalid_key(token)),
    };

    Ok(STANDARD.encode(encrypted).into_bytes())
}

/// Inverse of [`aes_encrypt`]: base64 decode, AES-CBC decrypt, PKCS7 unpad.
pub fn aes_decrypt(encoded: &[u8], token: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let iv = cbc_iv(token)?;
    let encrypted = STANDARD.decode(encoded)?;

    let plain = match token.len() {
        16 => Aes128CbcDec::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .decrypt_padded_vec_mut::<Pkcs7>(&encrypted),
        24 => Aes192CbcDec::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .decrypt_padded_vec_mut::<Pkcs7>(&encrypted),
        32 => Aes256CbcDec::new_from_slices(token, iv)
            .map_err(|_| invalid_key(token))?
            .decrypt_padded_vec_mut::<Pkcs7>(&encrypted),
        _ => return Err(invalid_key(token)),
    };

    plain.map_err(|_| CryptoError::Padding)
}

fn cbc_iv(token: &[u8]) -> Result<&[u8], CryptoError> {
    token.get(..AES_BLOCK_SIZE).ok_or_else(|| invalid_key(token))
}

fn invalid_key(token: &[u8]) -> CryptoError {
    CryptoError::InvalidKeyLength { len: token.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs7_pads_full_block_when_aligned() {
        let token = b"0123456789abcdef";
        let encoded = aes_encrypt(&[7u8; AES_BLOCK_SIZE], token).expect("encrypt failed");
        let raw = STANDARD.decode(&encoded).expect("base64");

        // One block of data plus one full block of padding.
        assert_eq!(raw.len(), 2 * AES_BLOCK_SIZE);
    }

    #[test]
    fn short_token_is_rejected_before_slicing_iv() {
        assert_eq!(
            aes_encrypt(b"x", b"abc"),
            Err(CryptoError::InvalidKeyLength { len: 3 })
        );
    }
}
