//! Secret Port error types.

use thiserror::Error;

pub type SecretResult<T> = Result<T, SecretError>;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("ciphertext too short to contain a nonce")]
    InvalidCiphertext,

    #[error("decryption key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("decryption failed")]
    DecryptFailed,
}
