//! Password based `.jenc` note containers
//!
//! Layout: 4 byte ASCII version, GCM nonce, PBKDF2 salt, ciphertext with the
//! 128 bit authentication tag appended.
use crate::error::{FitgrepError, Result};
use aes_gcm::aead::consts::U32;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// File suffix of encrypted notes.
pub const ENCRYPTED_FILE_SUFFIX: &str = ".jenc";

const VERSION_LEN: usize = 4;
const NONCE_LEN: usize = 32;
const SALT_LEN: usize = 64;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const KEY_ITERATIONS: u32 = 10_000;

type JencCipher = AesGcm<Aes256, U32>;

/// Turns the raw bytes of an encrypted file into plaintext.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, payload: &[u8], password: &SecretString) -> Result<Zeroizing<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JencVersion {
    /// PBKDF2 with HMAC-SHA512.
    V001,
    /// Legacy variant with HMAC-SHA1 key derivation.
    U001,
}

impl JencVersion {
    fn tag(self) -> &'static [u8; VERSION_LEN] {
        match self {
            JencVersion::V001 => b"V001",
            JencVersion::U001 => b"U001",
        }
    }

    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"V001" => Some(JencVersion::V001),
            b"U001" => Some(JencVersion::U001),
            _ => None,
        }
    }

    fn derive_key(self, password: &SecretString, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        let password = password.expose_secret().as_bytes();
        match self {
            JencVersion::V001 => {
                pbkdf2::pbkdf2_hmac::<sha2::Sha512>(password, salt, KEY_ITERATIONS, &mut key[..])
            }
            JencVersion::U001 => {
                pbkdf2::pbkdf2_hmac::<sha1::Sha1>(password, salt, KEY_ITERATIONS, &mut key[..])
            }
        }
        key
    }
}

/// Reads the version tag of a container.
pub fn version_of(payload: &[u8]) -> Result<JencVersion> {
    payload
        .get(..VERSION_LEN)
        .and_then(JencVersion::from_tag)
        .ok_or_else(|| FitgrepError::Decryption("unknown container version".to_string()))
}

pub fn decrypt(payload: &[u8], password: &SecretString) -> Result<Zeroizing<Vec<u8>>> {
    let version = version_of(payload)?;
    if payload.len() < VERSION_LEN + NONCE_LEN + SALT_LEN + TAG_LEN {
        return Err(FitgrepError::Decryption("container is truncated".to_string()));
    }

    let (nonce, rest) = payload[VERSION_LEN..].split_at(NONCE_LEN);
    let (salt, ciphertext) = rest.split_at(SALT_LEN);
    let key = version.derive_key(password, salt);
    let cipher = JencCipher::new_from_slice(&key[..])
        .map_err(|e| FitgrepError::Decryption(format!("cipher init failed: {e}")))?;

    cipher
        .decrypt(Nonce::<U32>::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| FitgrepError::Decryption("wrong password or corrupted file".to_string()))
}

pub fn encrypt(plaintext: &[u8], password: &SecretString, version: JencVersion) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_LEN];
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut nonce);
    OsRng.fill_bytes(&mut salt);

    let key = version.derive_key(password, &salt);
    let cipher = JencCipher::new_from_slice(&key[..])
        .map_err(|e| FitgrepError::Other(format!("cipher init failed: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::<U32>::from_slice(&nonce), plaintext)
        .map_err(|e| FitgrepError::Other(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(VERSION_LEN + NONCE_LEN + SALT_LEN + ciphertext.len());
    out.extend_from_slice(version.tag());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Default [`Decryptor`] for `.jenc` containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JencDecryptor;

impl Decryptor for JencDecryptor {
    fn decrypt(&self, payload: &[u8], password: &SecretString) -> Result<Zeroizing<Vec<u8>>> {
        decrypt(payload, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_decrypts_what_was_encrypted() {
        let sealed = encrypt(b"secret note\nline two", &secret("pw"), JencVersion::V001).unwrap();
        assert_eq!(&sealed[..4], b"V001");
        let plain = decrypt(&sealed, &secret("pw")).unwrap();
        assert_eq!(plain.as_slice(), b"secret note\nline two");
    }

    #[test]
    fn test_legacy_version() {
        let sealed = encrypt(b"old", &secret("pw"), JencVersion::U001).unwrap();
        assert_eq!(version_of(&sealed).unwrap(), JencVersion::U001);
        assert_eq!(decrypt(&sealed, &secret("pw")).unwrap().as_slice(), b"old");
    }

    #[test]
    fn test_wrong_password_fails() {
        let sealed = encrypt(b"text", &secret("right"), JencVersion::V001).unwrap();
        let err = decrypt(&sealed, &secret("wrong")).unwrap_err();
        assert!(matches!(err, FitgrepError::Decryption(_)));
    }

    #[test]
    fn test_unknown_version_fails() {
        let mut sealed = encrypt(b"text", &secret("pw"), JencVersion::V001).unwrap();
        sealed[0] = b'X';
        assert!(matches!(
            decrypt(&sealed, &secret("pw")),
            Err(FitgrepError::Decryption(_))
        ));
    }

    #[test]
    fn test_truncated_container_fails() {
        assert!(decrypt(b"V001short", &secret("pw")).is_err());
        assert!(decrypt(b"", &secret("pw")).is_err());
    }

    #[test]
    fn test_every_container_uses_fresh_nonce() {
        let a = encrypt(b"same", &secret("pw"), JencVersion::V001).unwrap();
        let b = encrypt(b"same", &secret("pw"), JencVersion::V001).unwrap();
        assert_ne!(a, b);
    }
}
