//! The three fixed cipher codes every codec understands.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::cipher::{self, AeadFrame, CipherError};
use crate::secrets::Secret;

/// Built-in ciphers, dispatched without indirection.
///
/// | code | payload |
/// |------|---------|
/// | `pt` | base64 of the plaintext, no confidentiality |
/// | `1`  | hex of the AES-256-GCM frame (legacy, still decryptable) |
/// | `2`  | base64 of the AES-256-GCM frame (default for new data) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinCipher {
    Plaintext,
    LegacyHex,
    AesGcmBase64,
}

impl BuiltinCipher {
    pub const ALL: [BuiltinCipher; 3] = [
        BuiltinCipher::Plaintext,
        BuiltinCipher::LegacyHex,
        BuiltinCipher::AesGcmBase64,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            BuiltinCipher::Plaintext => "pt",
            BuiltinCipher::LegacyHex => "1",
            BuiltinCipher::AesGcmBase64 => "2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Whether this cipher needs a secret at all.
    pub const fn requires_secret(self) -> bool {
        !matches!(self, BuiltinCipher::Plaintext)
    }

    /// Produce the envelope payload (the part after `code:`).
    ///
    /// # Errors
    ///
    /// [`CipherError::MissingSecret`] if an AEAD cipher gets no secret, plus
    /// the errors of [`cipher::seal`].
    pub fn encrypt(self, plaintext: &[u8], secret: Option<&Secret>) -> Result<String, CipherError> {
        match self {
            BuiltinCipher::Plaintext => Ok(STANDARD.encode(plaintext)),
            BuiltinCipher::LegacyHex => {
                let frame = cipher::seal(self.code(), plaintext, secret.ok_or(CipherError::MissingSecret)?)?;
                Ok(hex::encode(frame.to_bytes()))
            }
            BuiltinCipher::AesGcmBase64 => {
                let frame = cipher::seal(self.code(), plaintext, secret.ok_or(CipherError::MissingSecret)?)?;
                Ok(STANDARD.encode(frame.to_bytes()))
            }
        }
    }

    /// Recover the plaintext bytes from an envelope payload.
    ///
    /// # Errors
    ///
    /// [`CipherError::InvalidEncoding`] for bad hex or base64,
    /// [`CipherError::InvalidFormat`] for truncated frames and
    /// [`CipherError::AeadFailure`] when authentication fails.
    pub fn decrypt(self, payload: &str, secret: Option<&Secret>) -> Result<Vec<u8>, CipherError> {
        match self {
            BuiltinCipher::Plaintext => STANDARD
                .decode(payload)
                .map_err(|e| CipherError::InvalidEncoding(e.to_string())),
            BuiltinCipher::LegacyHex => {
                let bytes =
                    hex::decode(payload).map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
                self.open(&bytes, secret)
            }
            BuiltinCipher::AesGcmBase64 => {
                let bytes = STANDARD
                    .decode(payload)
                    .map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
                self.open(&bytes, secret)
            }
        }
    }

    fn open(self, bytes: &[u8], secret: Option<&Secret>) -> Result<Vec<u8>, CipherError> {
        let secret = secret.ok_or(CipherError::MissingSecret)?;
        let frame = AeadFrame::from_bytes(bytes)?;
        cipher::open(self.code(), &frame, secret)
    }
}

impl std::fmt::Display for BuiltinCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
