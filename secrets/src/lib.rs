//! Secret Port: decrypts at-rest MCP server credentials (API keys) before
//! they reach a live `ServerConnection`.

pub mod error;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

pub use error::{SecretError, SecretResult};

const NONCE_LEN: usize = 12;

/// Decrypts ciphertext produced by whatever process encrypts credentials
/// before they're written to `mcp_servers.api_key_enc`.
pub trait SecretDecryptor: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> SecretResult<Vec<u8>>;
}

/// AES-256-GCM adapter. Expects `ciphertext` laid out as a 12-byte random
/// nonce followed by the AEAD ciphertext+tag, matching the encryption side's
/// own framing (there is no separate length-prefix or AAD).
pub struct AesGcmDecryptor {
    cipher: Aes256Gcm,
}

impl AesGcmDecryptor {
    pub fn new(key: &[u8]) -> SecretResult<Self> {
        if key.len() != 32 {
            return Err(SecretError::KeyLength(key.len()));
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }
}

impl SecretDecryptor for AesGcmDecryptor {
    fn decrypt(&self, ciphertext: &[u8]) -> SecretResult<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(SecretError::InvalidCiphertext);
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, body)
            .map_err(|_| SecretError::DecryptFailed)
    }
}

/// Encrypts `plaintext` under `key`, laying out the result as a fresh random
/// nonce followed by the AEAD ciphertext+tag, matching [`AesGcmDecryptor`]'s
/// expected framing. Used by the inbound HTTP surface when a caller submits
/// an MCP server's API key for storage.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> SecretResult<Vec<u8>> {
    if key.len() != 32 {
        return Err(SecretError::KeyLength(key.len()));
    }
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ct = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| SecretError::DecryptFailed)?;
    Ok([nonce.as_slice(), ct.as_slice()].concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encrypt_decrypt() {
        let key = [7u8; 32];
        let ciphertext = encrypt(&key, b"sk-live-example-key").unwrap();
        let decryptor = AesGcmDecryptor::new(&key).unwrap();
        let plaintext = decryptor.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext, b"sk-live-example-key");
    }

    #[test]
    fn rejects_short_key() {
        assert!(matches!(AesGcmDecryptor::new(&[0u8; 16]), Err(SecretError::KeyLength(16))));
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let decryptor = AesGcmDecryptor::new(&[1u8; 32]).unwrap();
        assert!(matches!(decryptor.decrypt(&[0u8; 4]), Err(SecretError::InvalidCiphertext)));
    }

    #[test]
    fn rejects_tampered_ciphertext() {
        let key = [9u8; 32];
        let mut ciphertext = encrypt(&key, b"payload").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        let decryptor = AesGcmDecryptor::new(&key).unwrap();
        assert!(matches!(decryptor.decrypt(&ciphertext), Err(SecretError::DecryptFailed)));
    }
}
