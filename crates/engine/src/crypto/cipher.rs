//! AES-256-GCM sealing and opening of individual field values.
//!
//! Every call to [`seal`] draws a fresh 64-byte KDF salt and a fresh 96-bit IV
//! from the OS CSPRNG. The salt feeds PBKDF2 for password secrets and is still
//! written (but unused) for raw keys, so both secret kinds share one layout.
//! The salt is not associated data: under a raw key it is unauthenticated
//! padding, and altering it can neither break nor change the plaintext.
//!
//! **Never reuse an IV under the same key.** GCM nonce reuse breaks both
//! confidentiality and authentication.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm,
};
use fieldseal_common::SealError;
use thiserror::Error;

use crate::kdf::{self, SALT_LEN};
use crate::secrets::{Secret, SecretKind};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM IV (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Smallest well-formed frame: salt, IV and the tag of an empty plaintext.
pub const MIN_FRAME_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// AES-GCM encryption failed, or decryption failed authentication
    /// (wrong key or tampered data).
    #[error("aead operation failed")]
    AeadFailure,

    /// The decoded payload does not have the expected frame structure.
    #[error("invalid ciphertext frame: {0}")]
    InvalidFormat(String),

    /// The payload is not valid hex, base64 or UTF-8.
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),

    /// The PBKDF2 primitive rejected its inputs.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// An encrypting cipher was invoked without a secret.
    #[error("no secret provided for encrypted value")]
    MissingSecret,

    /// The secret's kind cannot be used by this cipher.
    #[error("secret kind {kind:?} is not supported by cipher {code}")]
    IncompatibleSecret { code: &'static str, kind: SecretKind },
}

impl From<CipherError> for SealError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::IncompatibleSecret { .. } => SealError::client(e.to_string()),
            other => SealError::crypto(other.to_string()),
        }
    }
}

/// A decoded AES-GCM frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadFrame {
    /// PBKDF2 salt (ignored for raw keys).
    pub salt: [u8; SALT_LEN],
    /// GCM IV.
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl AeadFrame {
    /// Concatenate `salt || nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split raw frame bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] if `bytes` is shorter than
    /// [`MIN_FRAME_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(CipherError::InvalidFormat(format!(
                "expected at least {MIN_FRAME_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let (salt_bytes, rest) = bytes.split_at(SALT_LEN);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(salt_bytes);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            salt,
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Encrypt `plaintext` under `secret` with a fresh salt and IV.
///
/// `code` names the calling cipher in error messages.
///
/// # Errors
///
/// Returns [`CipherError::IncompatibleSecret`] for custom-key secrets,
/// [`CipherError::KeyDerivation`] if PBKDF2 fails, and
/// [`CipherError::AeadFailure`] on an internal AEAD error.
pub fn seal(code: &'static str, plaintext: &[u8], secret: &Secret) -> Result<AeadFrame, CipherError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = build_cipher(code, secret, &salt)?;
    let ciphertext = cipher
        .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(AeadFrame {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt and authenticate `frame` under `secret`.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] if authentication fails, plus the key
/// errors of [`seal`].
pub fn open(code: &'static str, frame: &AeadFrame, secret: &Secret) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(code, secret, &frame.salt)?;
    cipher
        .decrypt(aes_gcm::Nonce::from_slice(&frame.nonce), frame.ciphertext.as_ref())
        .map_err(|_| CipherError::AeadFailure)
}

/// Fresh random key material from the OS CSPRNG, zeroed on drop.
pub(crate) fn random_key() -> zeroize::Zeroizing<[u8; KEY_LEN]> {
    let mut key = zeroize::Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut key[..]);
    key
}

fn build_cipher(code: &'static str, secret: &Secret, salt: &[u8]) -> Result<Aes256Gcm, CipherError> {
    let cipher = match secret.kind() {
        SecretKind::Password => {
            let key = kdf::derive_aes_key(secret.material(), salt)?;
            Aes256Gcm::new_from_slice(&key[..])
        }
        SecretKind::RawKey => Aes256Gcm::new_from_slice(secret.material()),
        kind @ SecretKind::CustomKey => {
            return Err(CipherError::IncompatibleSecret { code, kind });
        }
    };
    cipher.map_err(|_| CipherError::InvalidFormat(format!("AES key must be {KEY_LEN} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_secret() -> Secret {
        Secret::raw_key(0, &random_key()[..]).unwrap()
    }

    #[test]
    fn raw_key_round_trip() {
        let secret = raw_secret();
        let frame = seal("2", b"123-45-6789", &secret).unwrap();
        assert_eq!(frame.ciphertext.len(), 11 + TAG_LEN);
        assert_eq!(open("2", &frame, &secret).unwrap(), b"123-45-6789");
    }

    #[test]
    fn raw_key_ignores_salt() {
        let secret = raw_secret();
        let mut frame = seal("2", b"padding", &secret).unwrap();
        frame.salt = [0xff; SALT_LEN];
        assert_eq!(open("2", &frame, &secret).unwrap(), b"padding");
    }

    #[test]
    fn password_round_trip() {
        let secret = Secret::password(0, "pw").unwrap();
        let frame = seal("2", b"hello", &secret).unwrap();
        assert_eq!(open("2", &frame, &secret).unwrap(), b"hello");
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let frame = seal("2", b"secret", &raw_secret()).unwrap();
        assert!(matches!(
            open("2", &frame, &raw_secret()),
            Err(CipherError::AeadFailure)
        ));
    }

    #[test]
    fn wrong_password_fails_decryption() {
        let frame = seal("2", b"secret", &Secret::password(0, "a").unwrap()).unwrap();
        assert!(matches!(
            open("2", &frame, &Secret::password(0, "b").unwrap()),
            Err(CipherError::AeadFailure)
        ));
    }

    #[test]
    fn salt_and_nonce_are_fresh_per_call() {
        let secret = raw_secret();
        let a = seal("2", b"same", &secret).unwrap();
        let b = seal("2", b"same", &secret).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn custom_key_is_rejected() {
        let secret = Secret::custom_key(0, b"opaque").unwrap();
        let err = seal("2", b"x", &secret).unwrap_err();
        assert!(matches!(err, CipherError::IncompatibleSecret { code: "2", .. }));
        assert!(SealError::from(err).is_client());
    }

    #[test]
    fn frame_bytes_round_trip() {
        let frame = seal("1", b"hello", &raw_secret()).unwrap();
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), SALT_LEN + NONCE_LEN + 5 + TAG_LEN);
        assert_eq!(AeadFrame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn short_frame_rejected() {
        assert!(matches!(
            AeadFrame::from_bytes(&[0u8; SALT_LEN + NONCE_LEN]),
            Err(CipherError::InvalidFormat(_))
        ));
        assert!(AeadFrame::from_bytes(&[0u8; MIN_FRAME_LEN]).is_ok());
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let secret = raw_secret();
        let mut frame = seal("2", b"tamper me", &secret).unwrap();
        frame.ciphertext[0] ^= 0xFF;
        assert!(matches!(
            open("2", &frame, &secret),
            Err(CipherError::AeadFailure)
        ));
    }

    #[test]
    fn aead_errors_are_crypto_errors() {
        assert!(SealError::from(CipherError::AeadFailure).is_crypto());
        assert!(SealError::from(CipherError::MissingSecret).is_crypto());
    }
}
