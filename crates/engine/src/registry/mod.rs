//! [`CipherRegistry`]: the built-in suite plus integrator-supplied custom
//! ciphers, keyed by their envelope code.
//!
//! Custom ciphers live in an [`ArcSwap`]-backed map so the hot path
//! ([`CipherRegistry::resolve`], [`CipherRegistry::current_cipher`]) never
//! takes a lock. Mutations clone the map, apply the change and swap the new
//! map in under a writer mutex, so readers never observe a half-applied
//! registration.

pub mod validation;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use arc_swap::ArcSwap;
use fieldseal_common::{BoxError, SealError};
use tracing::{debug, warn};

use crate::crypto::{BuiltinCipher, CipherError};
use crate::secrets::{Secret, SecretCollection};

/// A cipher implemented outside this crate.
///
/// Implementations must be deterministic inverses of each other:
/// `decrypt(encrypt(p, s), s) == p`. [`CipherRegistry::register`] checks this
/// with a self-test before the cipher can be used.
#[cfg_attr(test, mockall::automock)]
pub trait CustomCipher: Send + Sync {
    /// Stable, non-empty envelope code. Must not contain `:`.
    fn code(&self) -> &str;

    /// Whether new encryptions should use this cipher. At most one registered
    /// cipher may answer `true`.
    fn is_current(&self) -> bool {
        false
    }

    /// Encrypt `plaintext` into an envelope payload.
    fn encrypt(&self, plaintext: &[u8], secret: &Secret) -> Result<String, BoxError>;

    /// Decrypt an envelope payload. Must fail on any integrity violation.
    fn decrypt(&self, payload: &[u8], secret: &Secret) -> Result<String, BoxError>;
}

/// A cipher selected for an operation.
#[derive(Clone)]
pub enum ResolvedCipher {
    Builtin(BuiltinCipher),
    Custom(Arc<dyn CustomCipher>),
}

impl ResolvedCipher {
    pub fn code(&self) -> &str {
        match self {
            ResolvedCipher::Builtin(b) => b.code(),
            ResolvedCipher::Custom(c) => c.code(),
        }
    }

    pub fn is_plaintext(&self) -> bool {
        matches!(self, ResolvedCipher::Builtin(BuiltinCipher::Plaintext))
    }

    /// Produce the envelope payload for `plaintext`.
    ///
    /// # Errors
    ///
    /// [`SealError::Crypto`] if the cipher fails or needs a secret and none is
    /// given; [`SealError::Client`] if the secret kind does not fit the cipher.
    pub fn encrypt(&self, plaintext: &[u8], secret: Option<&Secret>) -> Result<String, SealError> {
        match self {
            ResolvedCipher::Builtin(b) => Ok(b.encrypt(plaintext, secret)?),
            ResolvedCipher::Custom(c) => {
                let secret = secret.ok_or(CipherError::MissingSecret)?;
                c.encrypt(plaintext, secret).map_err(|e| {
                    SealError::crypto_with(format!("custom cipher '{}' failed to encrypt", c.code()), e)
                })
            }
        }
    }

    /// Recover the plaintext from an envelope payload.
    ///
    /// # Errors
    ///
    /// [`SealError::Crypto`] on authentication failure, malformed payload,
    /// non-UTF-8 plaintext or a failing custom cipher.
    pub fn decrypt(&self, payload: &str, secret: Option<&Secret>) -> Result<String, SealError> {
        match self {
            ResolvedCipher::Builtin(b) => {
                let bytes = b.decrypt(payload, secret)?;
                String::from_utf8(bytes).map_err(|e| {
                    SealError::from(CipherError::InvalidEncoding(format!("plaintext is not UTF-8: {e}")))
                })
            }
            ResolvedCipher::Custom(c) => {
                let secret = secret.ok_or(CipherError::MissingSecret)?;
                c.decrypt(payload.as_bytes(), secret).map_err(|e| {
                    SealError::crypto_with(format!("custom cipher '{}' failed to decrypt", c.code()), e)
                })
            }
        }
    }
}

impl std::fmt::Debug for ResolvedCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedCipher::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            ResolvedCipher::Custom(c) => f.debug_tuple("Custom").field(&c.code()).finish(),
        }
    }
}

#[derive(Clone, Default)]
struct CustomMap {
    by_code: HashMap<String, Arc<dyn CustomCipher>>,
    current: Option<String>,
}

/// Registry of ciphers available to one codec.
///
/// Built-ins are always present and cannot be unregistered.
pub struct CipherRegistry {
    encryption_enabled: bool,
    customs: ArcSwap<CustomMap>,
    writer: Mutex<()>,
}

impl CipherRegistry {
    /// Create a registry. With `encryption_enabled == false` the current cipher
    /// is always the plaintext passthrough.
    pub fn new(encryption_enabled: bool) -> Self {
        Self {
            encryption_enabled,
            customs: ArcSwap::from_pointee(CustomMap::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn encryption_enabled(&self) -> bool {
        self.encryption_enabled
    }

    /// Validate and register a custom cipher.
    ///
    /// The self-test uses a custom key from `secrets` when there is one and a
    /// random throwaway key otherwise. A cipher that fails any check is never
    /// added.
    ///
    /// # Errors
    ///
    /// [`SealError::Client`] if the code is empty, contains `:`, collides with
    /// a built-in or registered code, if a second cipher claims to be current,
    /// or if the self-test fails.
    pub fn register(
        &self,
        cipher: Arc<dyn CustomCipher>,
        secrets: Option<&SecretCollection>,
    ) -> Result<(), SealError> {
        let code = cipher.code().to_owned();
        if code.trim().is_empty() {
            return Err(SealError::client("custom cipher code must not be empty"));
        }
        if code.contains(':') {
            return Err(SealError::client(format!(
                "custom cipher code '{code}' must not contain ':'"
            )));
        }
        if BuiltinCipher::from_code(&code).is_some() {
            return Err(SealError::client(format!(
                "custom cipher code '{code}' is reserved for a built-in cipher"
            )));
        }
        let is_current = cipher.is_current();

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = self.customs.load_full();
        if existing.by_code.contains_key(&code) {
            return Err(SealError::client(format!(
                "custom cipher code '{code}' is already registered"
            )));
        }
        if is_current {
            if let Some(current) = &existing.current {
                return Err(SealError::client(format!(
                    "custom cipher '{code}' is marked current but '{current}' already is"
                )));
            }
        }

        if let Err(e) = validation::self_test(cipher.as_ref(), secrets) {
            warn!(code = %code, error = %e, "custom cipher failed self-test");
            return Err(SealError::client_with(
                format!("custom cipher '{code}' failed validation"),
                e,
            ));
        }

        let mut next = CustomMap::clone(&existing);
        if is_current {
            next.current = Some(code.clone());
        }
        next.by_code.insert(code.clone(), cipher);
        self.customs.store(Arc::new(next));

        debug!(code = %code, current = is_current, "registered custom cipher");
        Ok(())
    }

    /// Remove the custom cipher with the same code as `cipher`.
    ///
    /// Returns `true` if something was removed.
    pub fn unregister(&self, cipher: &dyn CustomCipher) -> bool {
        self.unregister_code(cipher.code())
    }

    /// Remove the custom cipher registered under `code`. Built-in codes are
    /// never removed.
    pub fn unregister_code(&self, code: &str) -> bool {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = self.customs.load_full();
        if !existing.by_code.contains_key(code) {
            return false;
        }
        let mut next = CustomMap::clone(&existing);
        next.by_code.remove(code);
        if next.current.as_deref() == Some(code) {
            next.current = None;
        }
        self.customs.store(Arc::new(next));

        debug!(code = %code, "unregistered custom cipher");
        true
    }

    /// Look up a cipher by envelope code: built-ins first, then custom ciphers.
    pub fn resolve(&self, code: &str) -> Option<ResolvedCipher> {
        if let Some(b) = BuiltinCipher::from_code(code) {
            return Some(ResolvedCipher::Builtin(b));
        }
        self.customs
            .load()
            .by_code
            .get(code)
            .cloned()
            .map(ResolvedCipher::Custom)
    }

    /// The cipher used for new encryptions: plaintext when encryption is
    /// disabled, else the current custom cipher, else built-in `"2"`.
    pub fn current_cipher(&self) -> ResolvedCipher {
        if !self.encryption_enabled {
            return ResolvedCipher::Builtin(BuiltinCipher::Plaintext);
        }
        let map = self.customs.load();
        map.current
            .as_ref()
            .and_then(|code| map.by_code.get(code))
            .cloned()
            .map(ResolvedCipher::Custom)
            .unwrap_or(ResolvedCipher::Builtin(BuiltinCipher::AesGcmBase64))
    }

    /// Codes of the registered custom ciphers, sorted.
    pub fn custom_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.customs.load().by_code.keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl std::fmt::Debug for CipherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherRegistry")
            .field("encryption_enabled", &self.encryption_enabled)
            .field("custom_codes", &self.custom_codes())
            .finish()
    }
}
