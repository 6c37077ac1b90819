use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("application key is not valid base64 or is empty")]
    InvalidKey,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,
}

/// Cipher
///
/// AES-256-GCM over cookie payloads. Output is `base64url(nonce || ciphertext || tag)`,
/// safe to place in a cookie value without further encoding.
///
/// Every call to [`Cipher::encrypt`] draws a fresh 96-bit nonce from the OS RNG, so
/// encrypting the same plaintext twice yields different ciphertexts. Any modification of
/// the ciphertext is caught by the GCM tag and reported as [`CipherError::DecryptionFailed`].
#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    /// from_base64_key
    ///
    /// Derives the cipher key from a base64 secret (an optional `base64:` prefix is accepted).
    /// A 32-byte secret is used as-is; any other length is hashed down with SHA-256.
    pub fn from_base64_key(secret: &str) -> Result<Self, CipherError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix("base64:").unwrap_or(encoded);
        let raw = STANDARD
            .decode(encoded)
            .map_err(|_| CipherError::InvalidKey)?;

        if raw.is_empty() {
            return Err(CipherError::InvalidKey);
        }

        let key = if raw.len() == 32 {
            raw
        } else {
            Sha256::digest(&raw).to_vec()
        };

        let aead = Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::InvalidKey)?;
        Ok(Self { aead })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, CipherError> {
        let raw = URL_SAFE_NO_PAD
            .decode(ciphertext.trim())
            .map_err(|_| CipherError::DecryptionFailed)?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::DecryptionFailed);
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::DecryptionFailed)
    }
}
