use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

#[derive(Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// Not base64, or too short to hold salt, nonce and tag.
    MalformedEnvelope,
    /// Authentication failed: wrong secret or tampered ciphertext.
    DecryptionFailed,
    EncryptionFailed,
    /// Decrypted bytes were not UTF-8.
    InvalidPlaintext,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::MalformedEnvelope => write!(f, "ciphertext envelope is malformed"),
            CryptoError::DecryptionFailed => write!(f, "ciphertext could not be authenticated"),
            CryptoError::EncryptionFailed => write!(f, "encryption failed"),
            CryptoError::InvalidPlaintext => write!(f, "decrypted data is not valid UTF-8"),
        }
    }
}

impl std::error::Error for CryptoError {}

fn derive_key(secret: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut key);
    key
}

/// AES-256-GCM under a PBKDF2-HMAC-SHA256 key. Output is base64(salt || nonce || ciphertext+tag).
pub fn encrypt(secret: &str, iterations: u32, plaintext: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let key = derive_key(secret, &salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::EncryptionFailed)?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&sealed);
    Ok(STANDARD.encode(envelope))
}

pub fn decrypt(secret: &str, iterations: u32, envelope: &str) -> Result<String, CryptoError> {
    let raw = STANDARD
        .decode(envelope.trim())
        .map_err(|_| CryptoError::MalformedEnvelope)?;
    if raw.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::MalformedEnvelope);
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let key = derive_key(secret, salt, iterations);
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::DecryptionFailed)?;
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    String::from_utf8(plain).map_err(|_| CryptoError::InvalidPlaintext)
}
