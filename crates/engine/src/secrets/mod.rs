//! Secret data model: individual [`Secret`]s and the [`SecretCollection`]
//! that designates which one is current.
//!
//! # Security invariants
//!
//! - Secret material is zeroed when the last reference is dropped.
//! - Secret material is **never** logged; `Debug` prints `[REDACTED]`.
//! - A [`SecretCollection`] is immutable once built. Rotation means building a
//!   new collection that still contains the old secrets.

pub mod accessor;
pub mod collection;

pub use accessor::SecretsAccessor;
pub use collection::SecretCollection;

use fieldseal_common::SealError;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::KEY_LEN;

/// Errors produced while building secrets and secret collections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret version must be >= 0, got {0}")]
    NegativeVersion(i32),

    #[error("secret material must not be empty (version {0})")]
    EmptyMaterial(i32),

    /// A raw key is not exactly [`KEY_LEN`] bytes.
    #[error("RawKey secret must be {KEY_LEN} bytes, got {len} (version {version})")]
    InvalidKeyLength { version: i32, len: usize },

    #[error("secret collection must contain at least one secret")]
    EmptyCollection,

    #[error("duplicate secret version {0}")]
    DuplicateVersion(i32),

    #[error("current secret version {0} is not present in the collection")]
    CurrentVersionMissing(i32),

    #[error("secret {version} is flagged both isKey and isForCustomEncryption")]
    ConflictingFlags { version: i32 },

    #[error("secret {version} is not valid base64: {reason}")]
    InvalidEncoding { version: i32, reason: String },

    #[error("invalid secrets document: {0}")]
    InvalidDocument(String),
}

impl From<SecretError> for SealError {
    fn from(e: SecretError) -> Self {
        SealError::client(e.to_string())
    }
}

/// How a secret's material is turned into a cipher key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    /// Low-entropy text; stretched through PBKDF2 before use as an AES key.
    Password,
    /// A ready-made 32-byte AES key, used as-is.
    RawKey,
    /// Opaque material meaningful only to a custom cipher, used as-is.
    CustomKey,
}

#[derive(Clone)]
enum Material {
    Password(Zeroizing<Vec<u8>>),
    RawKey(Zeroizing<[u8; KEY_LEN]>),
    CustomKey(Zeroizing<Vec<u8>>),
}

/// A single versioned secret.
///
/// The kind is fixed at construction, so a secret that is both a raw key and a
/// custom key cannot exist.
#[derive(Clone)]
pub struct Secret {
    version: i32,
    material: Material,
}

impl Secret {
    /// A password-class secret.
    ///
    /// # Errors
    ///
    /// [`SecretError::NegativeVersion`] or [`SecretError::EmptyMaterial`].
    pub fn password(version: i32, material: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let bytes = checked(version, material.as_ref())?;
        Ok(Self {
            version,
            material: Material::Password(Zeroizing::new(bytes.to_vec())),
        })
    }

    /// A raw AES-256 key.
    ///
    /// # Errors
    ///
    /// [`SecretError::InvalidKeyLength`] unless `key` is exactly [`KEY_LEN`]
    /// bytes, plus the checks of [`Secret::password`].
    pub fn raw_key(version: i32, key: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let bytes = checked(version, key.as_ref())?;
        if bytes.len() != KEY_LEN {
            return Err(SecretError::InvalidKeyLength {
                version,
                len: bytes.len(),
            });
        }
        let mut buf = Zeroizing::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self {
            version,
            material: Material::RawKey(buf),
        })
    }

    /// Material for a custom cipher. Any non-empty length is accepted.
    pub fn custom_key(version: i32, material: impl AsRef<[u8]>) -> Result<Self, SecretError> {
        let bytes = checked(version, material.as_ref())?;
        Ok(Self {
            version,
            material: Material::CustomKey(Zeroizing::new(bytes.to_vec())),
        })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn kind(&self) -> SecretKind {
        match self.material {
            Material::Password(_) => SecretKind::Password,
            Material::RawKey(_) => SecretKind::RawKey,
            Material::CustomKey(_) => SecretKind::CustomKey,
        }
    }

    /// Borrow the raw material bytes.
    ///
    /// Callers should use the slice and drop it promptly; never log it.
    pub fn material(&self) -> &[u8] {
        match &self.material {
            Material::Password(m) | Material::CustomKey(m) => m.as_slice(),
            Material::RawKey(k) => &k[..],
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("version", &self.version)
            .field("kind", &self.kind())
            .field("material", &"[REDACTED]")
            .finish()
    }
}

fn checked(version: i32, material: &[u8]) -> Result<&[u8], SecretError> {
    if version < 0 {
        return Err(SecretError::NegativeVersion(version));
    }
    if material.is_empty() {
        return Err(SecretError::EmptyMaterial(version));
    }
    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_keeps_bytes_and_kind() {
        let s = Secret::password(3, "pw").unwrap();
        assert_eq!(s.version(), 3);
        assert_eq!(s.kind(), SecretKind::Password);
        assert_eq!(s.material(), b"pw");
    }

    #[test]
    fn raw_key_requires_exact_length() {
        assert!(Secret::raw_key(0, [7u8; KEY_LEN]).is_ok());
        assert_eq!(
            Secret::raw_key(0, [7u8; 31]).unwrap_err(),
            SecretError::InvalidKeyLength { version: 0, len: 31 }
        );
        assert_eq!(
            Secret::raw_key(0, [7u8; 33]).unwrap_err(),
            SecretError::InvalidKeyLength { version: 0, len: 33 }
        );
    }

    #[test]
    fn custom_key_accepts_any_length() {
        let s = Secret::custom_key(1, [1u8; 5]).unwrap();
        assert_eq!(s.kind(), SecretKind::CustomKey);
        assert_eq!(s.material().len(), 5);
    }

    #[test]
    fn negative_version_rejected() {
        assert_eq!(
            Secret::password(-1, "pw").unwrap_err(),
            SecretError::NegativeVersion(-1)
        );
        assert!(Secret::raw_key(-5, [0u8; KEY_LEN]).is_err());
    }

    #[test]
    fn empty_material_rejected() {
        assert_eq!(
            Secret::password(0, "").unwrap_err(),
            SecretError::EmptyMaterial(0)
        );
        assert!(Secret::custom_key(0, [0u8; 0]).is_err());
    }

    #[test]
    fn secret_redacted_in_debug() {
        let s = Secret::password(0, "hunter2").unwrap();
        let rendered = format!("{s:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn secret_errors_are_client_errors() {
        let e: SealError = SecretError::DuplicateVersion(1).into();
        assert!(e.is_client());
        assert!(e.message().contains("duplicate secret version 1"));
    }
}
