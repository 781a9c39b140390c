//! Decryption of `ENC(<b64>)`-wrapped credential values.
//!
//! The wire format is the standard Fernet token layout: a 32-byte key,
//! url-safe base64 encoded, splits into a 16-byte HMAC signing key and a
//! 16-byte AES-128-CBC encryption key. A token is
//! `version(1) || timestamp(8, big-endian) || iv(16) || ciphertext || hmac(32)`,
//! itself url-safe base64 encoded. This lets credentials be produced by any
//! standard Fernet implementation, not just this crate.

use aes::Aes128;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

const FERNET_VERSION: u8 = 0x80;
const KEY_LEN: usize = 32;
const HMAC_LEN: usize = 32;
const IV_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 8; // version + timestamp

/// Errors that can occur while decrypting a Fernet-wrapped credential.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FernetError {
    /// The key wasn't valid url-safe base64, or wasn't 32 bytes once decoded.
    #[error("invalid fernet key")]
    InvalidKey,
    /// The token wasn't valid url-safe base64, or was too short to be a token.
    #[error("malformed token")]
    MalformedToken,
    /// The token's version byte didn't match the only version this decoder supports.
    #[error("unsupported token version")]
    UnsupportedVersion,
    /// The HMAC signature didn't verify; the token was tampered with or
    /// signed with a different key.
    #[error("signature verification failed")]
    InvalidSignature,
    /// The ciphertext didn't decrypt to validly padded plaintext.
    #[error("decryption failed")]
    DecryptionFailed,
    /// The decrypted plaintext wasn't valid UTF-8.
    #[error("plaintext was not valid utf-8")]
    InvalidUtf8,
}

/// A decoded Fernet key, split into its signing and encryption halves.
pub struct FernetKey {
    signing_key: [u8; 16],
    encryption_key: [u8; 16],
}

impl FernetKey {
    /// Decode a url-safe base64 32-byte Fernet key.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError::InvalidKey`] when the input isn't valid
    /// url-safe base64 or doesn't decode to exactly 32 bytes.
    pub fn decode(key: &str) -> Result<Self, FernetError> {
        let bytes = URL_SAFE.decode(key.trim()).map_err(|_| FernetError::InvalidKey)?;
        if bytes.len() != KEY_LEN {
            return Err(FernetError::InvalidKey);
        }
        let mut signing_key = [0u8; 16];
        let mut encryption_key = [0u8; 16];
        signing_key.copy_from_slice(&bytes[..16]);
        encryption_key.copy_from_slice(&bytes[16..]);
        Ok(Self { signing_key, encryption_key })
    }

    /// Decrypt and authenticate a Fernet token, returning the plaintext string.
    ///
    /// # Errors
    ///
    /// Returns [`FernetError`] when the token is malformed, the signature
    /// doesn't verify, or the ciphertext doesn't decrypt to valid UTF-8.
    pub fn decrypt(&self, token: &str) -> Result<String, FernetError> {
        let data = URL_SAFE.decode(token.trim()).map_err(|_| FernetError::MalformedToken)?;
        if data.len() < HEADER_LEN + IV_LEN + HMAC_LEN {
            return Err(FernetError::MalformedToken);
        }
        if data[0] != FERNET_VERSION {
            return Err(FernetError::UnsupportedVersion);
        }

        let (signed, tag) = data.split_at(data.len() - HMAC_LEN);
        self.verify(signed, tag)?;

        let iv = &signed[HEADER_LEN..HEADER_LEN + IV_LEN];
        let ciphertext = &signed[HEADER_LEN + IV_LEN..];

        let mut buf = ciphertext.to_vec();
        #[allow(clippy::unwrap_used)]
        let decryptor = Aes128CbcDec::new_from_slices(&self.encryption_key, iv).unwrap();
        let plaintext = decryptor
            .decrypt_padded_mut::<Pkcs7>(&mut buf)
            .map_err(|_| FernetError::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| FernetError::InvalidUtf8)
    }

    fn verify(&self, signed: &[u8], tag: &[u8]) -> Result<(), FernetError> {
        #[allow(clippy::unwrap_used)]
        let mut mac = HmacSha256::new_from_slice(&self.signing_key).unwrap();
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| FernetError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::block_padding::Pkcs7 as EncPkcs7;
    use cbc::cipher::BlockEncryptMut;

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    fn encrypt_token(key: &FernetKey, iv: [u8; 16], timestamp: u64, plaintext: &[u8]) -> String {
        let encryptor = Aes128CbcEnc::new_from_slices(&key.encryption_key, &iv).unwrap();
        let mut buf = vec![0u8; plaintext.len() + 16];
        let ciphertext_len = encryptor.encrypt_padded_b2b_mut::<EncPkcs7>(plaintext, &mut buf).unwrap().len();
        buf.truncate(ciphertext_len);

        let mut signed = Vec::new();
        signed.push(0x80);
        signed.extend_from_slice(&timestamp.to_be_bytes());
        signed.extend_from_slice(&iv);
        signed.extend_from_slice(&buf);

        let mut mac = HmacSha256::new_from_slice(&key.signing_key).unwrap();
        mac.update(&signed);
        let tag = mac.finalize().into_bytes();
        signed.extend_from_slice(&tag);

        URL_SAFE.encode(signed)
    }

    fn fixed_key() -> (String, FernetKey) {
        let raw = [7u8; 32];
        let encoded = URL_SAFE.encode(raw);
        let key = FernetKey::decode(&encoded).unwrap();
        (encoded, key)
    }

    #[test]
    fn round_trips_a_token() {
        let (_encoded, key) = fixed_key();
        let token = encrypt_token(&key, [1u8; 16], 1_700_000_000, b"super-secret-token");
        assert_eq!(key.decrypt(&token).unwrap(), "super-secret-token");
    }

    #[test]
    fn rejects_a_tampered_signature() {
        let (_encoded, key) = fixed_key();
        let mut token_bytes = URL_SAFE.decode(encrypt_token(&key, [2u8; 16], 1, b"hello")).unwrap();
        let last = token_bytes.len() - 1;
        token_bytes[last] ^= 0xFF;
        let tampered = URL_SAFE.encode(token_bytes);
        assert_eq!(key.decrypt(&tampered), Err(FernetError::InvalidSignature));
    }

    #[test]
    fn rejects_an_invalid_key_length() {
        assert_eq!(FernetKey::decode("dG9vc2hvcnQ="), Err(FernetError::InvalidKey));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let (_encoded, key) = fixed_key();
        assert_eq!(key.decrypt("not-base64!!"), Err(FernetError::MalformedToken));
    }
}
