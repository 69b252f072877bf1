use std::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use thiserror::Error;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Cipher secret must be at least {KEY_LEN} bytes")]
    InvalidKey,
    #[error("Sealed credential is shorter than its nonce")]
    Truncated,
    #[error("Could not seal credential")]
    Encrypt,
    #[error("Sealed credential failed authentication")]
    Decrypt,
    #[error("Opened credential is not UTF-8")]
    NotUtf8,
}

/// Seals the interaction credential that rides inside the public flag toggle token.
///
/// Every message gets a fresh random nonce, stored in front of the ciphertext, so equal
/// credentials never produce equal tokens and any tampering is caught on open.
pub struct TokenCipher {
    cipher: ChaCha20Poly1305,
}

impl TokenCipher {
    /// Keys the cipher with the first [`KEY_LEN`] bytes of `secret`.
    pub fn new(secret: &[u8]) -> Result<Self, CipherError> {
        let key = secret.get(..KEY_LEN).ok_or(CipherError::InvalidKey)?;
        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        })
    }

    pub fn seal(&self, credential: &str) -> Result<Vec<u8>, CipherError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, credential.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<String, CipherError> {
        if sealed.len() < NONCE_LEN {
            return Err(CipherError::Truncated);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
    }
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}
