// file: src/utils/crypto.rs
// description: AES-256-GCM encryption for stored Git hosting tokens
// reference: https://docs.rs/aes-gcm

use crate::error::{Result, WorklogError};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypts tokens as base64(nonce || ciphertext).
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// `key` is a base64-encoded 32-byte key.
    pub fn new(key: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|e| WorklogError::Crypto(format!("encryption key is not valid base64: {}", e)))?;

        if bytes.len() != KEY_LEN {
            return Err(WorklogError::Crypto(format!(
                "encryption key must decode to {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }

        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    pub fn generate_key() -> String {
        let key = Aes256Gcm::generate_key(OsRng);
        STANDARD.encode(key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| WorklogError::Crypto(format!("encryption failed: {}", e)))?;

        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(payload))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let payload = STANDARD
            .decode(encoded.trim())
            .map_err(|e| WorklogError::Crypto(format!("ciphertext is not valid base64: {}", e)))?;

        if payload.len() <= NONCE_LEN {
            return Err(WorklogError::Crypto("ciphertext is too short".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| WorklogError::Crypto("decryption failed: wrong key or corrupted data".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| WorklogError::Crypto(format!("decrypted token is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = CredentialCipher::new(&CredentialCipher::generate_key()).unwrap();
        let encrypted = cipher.encrypt("glpat-secret").unwrap();
        assert_ne!(encrypted, "glpat-secret");
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "glpat-secret");
    }

    #[test]
    fn test_nonce_differs_per_encryption() {
        let cipher = CredentialCipher::new(&CredentialCipher::generate_key()).unwrap();
        let a = cipher.encrypt("token").unwrap();
        let b = cipher.encrypt("token").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = CredentialCipher::new(&CredentialCipher::generate_key()).unwrap();
        let b = CredentialCipher::new(&CredentialCipher::generate_key()).unwrap();
        let encrypted = a.encrypt("token").unwrap();
        assert!(matches!(b.decrypt(&encrypted), Err(WorklogError::Crypto(_))));
    }

    #[test]
    fn test_rejects_short_key() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(CredentialCipher::new(&short).is_err());
        assert!(CredentialCipher::new("not base64!").is_err());
    }
}
