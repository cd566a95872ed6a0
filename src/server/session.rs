//! Encrypted cookie session.
//!
//! The last generation a browser saw travels in the `smile_session` cookie
//! so that a later rating can be credited to the right tags. The payload is
//! JSON sealed with AES-256-GCM under a key derived from `SMILE_SECRET`
//! with Argon2id. Anything that fails to decrypt or parse reads as no
//! session at all.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use axum::http::{header, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;

use crate::storage::Generation;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "smile_session";

/// Size of the encryption key in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes (96 bits for AES-GCM).
pub const NONCE_SIZE: usize = 12;

/// Fixed salt; the secret itself is what varies between deployments.
const KEY_SALT: &[u8] = b"i-need-a-smile.session.v1";

/// Errors that can occur while sealing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key used to seal and open session cookies.
#[derive(Clone)]
pub struct SessionKey {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Derives the cookie key from the application secret.
    pub fn derive(secret: &str) -> Result<Self, SessionError> {
        let salt = SaltString::encode_b64(KEY_SALT)
            .map_err(|e| SessionError::KeyDerivation(format!("Invalid salt: {e}")))?;

        let hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;

        let output = hash
            .hash
            .ok_or_else(|| SessionError::KeyDerivation("No hash output".to_string()))?;

        let bytes = output.as_bytes();
        if bytes.len() < KEY_SIZE {
            return Err(SessionError::KeyDerivation("Derived key too short".to_string()));
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes[..KEY_SIZE]);
        Ok(Self { key })
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    /// Encrypts a generation into a cookie-safe string.
    ///
    /// Format: base64url(`nonce (12 bytes) || ciphertext || tag (16 bytes)`).
    pub fn seal(&self, generation: &Generation) -> Result<String, SessionError> {
        let plaintext = serde_json::to_vec(generation)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| SessionError::Encryption(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Decrypts a cookie value. Returns `None` for anything tampered or malformed.
    pub fn open(&self, value: &str) -> Option<Generation> {
        let data = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        if data.len() < NONCE_SIZE {
            return None;
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;

        serde_json::from_slice(&plaintext).ok()
    }

    /// Reads the session from request headers.
    pub fn session_from(&self, headers: &HeaderMap) -> Option<Generation> {
        cookie_value(headers, COOKIE_NAME).and_then(|v| self.open(&v))
    }
}

/// Finds a cookie by name across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

/// `Set-Cookie` value storing a sealed session.
pub fn set_cookie(sealed: &str) -> HeaderValue {
    let cookie = format!("{COOKIE_NAME}={sealed}; Path=/; HttpOnly; SameSite=Lax");
    // base64url and the fixed attributes are always valid header bytes
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_cookie())
}

/// `Set-Cookie` value that removes the session.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("smile_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
