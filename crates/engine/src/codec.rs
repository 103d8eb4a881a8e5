//! [`EnvelopeCodec`]: the encrypt/decrypt entry point used by the rest of the
//! SDK.
//!
//! An envelope is `"<code>:<payload>"`. The secret version used to produce it
//! is not part of the text; callers persist it next to the envelope and hand
//! it back on decrypt.
//!
//! Decryption walks ParsePrefix → SelectCipher → ResolveSecret → RunCipher.
//! Any step may fail terminally; nothing is retried here.

use std::sync::Arc;

use fieldseal_common::SealError;
use tracing::warn;

use crate::registry::{CipherRegistry, CustomCipher};
use crate::secrets::{SecretCollection, SecretsAccessor};

/// Separator between cipher code and payload.
pub const CODE_SEPARATOR: char = ':';

/// A parsed envelope borrowing from its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub code: &'a str,
    pub payload: &'a str,
}

impl<'a> Envelope<'a> {
    /// Split `text` at the first `:`.
    ///
    /// # Errors
    ///
    /// [`SealError::Crypto`] if there is no separator.
    pub fn parse(text: &'a str) -> Result<Self, SealError> {
        text.split_once(CODE_SEPARATOR)
            .map(|(code, payload)| Self { code, payload })
            .ok_or_else(|| SealError::crypto("unparseable envelope: missing cipher code separator"))
    }
}

impl std::fmt::Display for Envelope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{CODE_SEPARATOR}{}", self.code, self.payload)
    }
}

/// Result of [`EnvelopeCodec::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    /// `"<code>:<payload>"` text to store in place of the plaintext.
    pub envelope: String,
    /// Version of the secret used; `None` for the plaintext cipher.
    pub secret_version: Option<i32>,
}

/// Encrypts and decrypts field values for one SDK session.
///
/// Cheap to share: wrap it in an `Arc` and call it from any thread.
pub struct EnvelopeCodec {
    secrets: Option<Arc<dyn SecretsAccessor>>,
    registry: CipherRegistry,
}

impl EnvelopeCodec {
    /// Build a codec, registering `custom_ciphers` in order.
    ///
    /// With `secrets == None` encryption is disabled and new values are
    /// written with the plaintext cipher.
    ///
    /// # Errors
    ///
    /// [`SealError::Client`] if the accessor fails while custom ciphers need
    /// validation secrets, or if any custom cipher is rejected (including a
    /// second cipher marked current).
    pub fn new(
        secrets: Option<Arc<dyn SecretsAccessor>>,
        custom_ciphers: Vec<Arc<dyn CustomCipher>>,
    ) -> Result<Self, SealError> {
        let codec = Self {
            registry: CipherRegistry::new(secrets.is_some()),
            secrets,
        };
        for cipher in custom_ciphers {
            codec.register_cipher(cipher)?;
        }
        Ok(codec)
    }

    /// A codec with encryption disabled.
    pub fn plaintext() -> Self {
        Self {
            secrets: None,
            registry: CipherRegistry::new(false),
        }
    }

    /// A codec over a fixed secret collection and the built-in ciphers.
    pub fn with_secrets(secrets: SecretCollection) -> Self {
        Self {
            secrets: Some(Arc::new(secrets)),
            registry: CipherRegistry::new(true),
        }
    }

    pub fn registry(&self) -> &CipherRegistry {
        &self.registry
    }

    /// Register a custom cipher, validating it against the configured secrets.
    pub fn register_cipher(&self, cipher: Arc<dyn CustomCipher>) -> Result<(), SealError> {
        let secrets = self.load_secrets()?;
        self.registry.register(cipher, secrets.as_ref())
    }

    /// Encrypt `plaintext` with the current cipher and current secret.
    ///
    /// # Errors
    ///
    /// [`SealError::Client`] if secrets cannot be obtained or do not fit the
    /// current cipher; [`SealError::Crypto`] if the cipher fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<Encrypted, SealError> {
        let cipher = self.registry.current_cipher();
        if cipher.is_plaintext() {
            let payload = cipher.encrypt(plaintext.as_bytes(), None)?;
            return Ok(Encrypted {
                envelope: Envelope { code: cipher.code(), payload: &payload }.to_string(),
                secret_version: None,
            });
        }

        let secrets = self
            .load_secrets()?
            .ok_or_else(|| SealError::client("encryption requires a secret collection"))?;
        let secret = secrets.current();
        let payload = cipher.encrypt(plaintext.as_bytes(), Some(secret))?;
        Ok(Encrypted {
            envelope: Envelope { code: cipher.code(), payload: &payload }.to_string(),
            secret_version: Some(secret.version()),
        })
    }

    /// Decrypt a stored envelope.
    ///
    /// `None` or an empty envelope means "no value" and yields `Ok(None)`. A
    /// missing or negative `secret_version` is read as version 0, which is what
    /// records written before versioning carry.
    ///
    /// # Errors
    ///
    /// - [`SealError::Crypto`]: no separator, unknown code, encrypted value
    ///   without configured secrets, authentication failure.
    /// - [`SealError::Client`]: secrets accessor failure, unknown version.
    pub fn decrypt(
        &self,
        envelope: Option<&str>,
        secret_version: Option<i32>,
    ) -> Result<Option<String>, SealError> {
        let text = match envelope {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(None),
        };

        let parsed = Envelope::parse(text)?;
        let cipher = self.registry.resolve(parsed.code);
        if let Some(plain) = cipher.as_ref().filter(|c| c.is_plaintext()) {
            return plain.decrypt(parsed.payload, None).map(Some);
        }

        let secrets = self
            .load_secrets()?
            .ok_or_else(|| SealError::crypto("no secret provided for encrypted value"))?;
        let cipher = cipher.ok_or_else(|| {
            SealError::crypto(format!("unknown cipher format '{}'", parsed.code))
        })?;

        let version = match secret_version {
            Some(v) if v >= 0 => v,
            other => {
                warn!(
                    secret_version = ?other,
                    "missing or negative secret version; falling back to version 0"
                );
                0
            }
        };
        let secret = secrets.get(version).ok_or_else(|| {
            SealError::client(format!("secret version {version} not found"))
        })?;

        cipher.decrypt(parsed.payload, Some(secret)).map(Some)
    }

    fn load_secrets(&self) -> Result<Option<SecretCollection>, SealError> {
        self.secrets
            .as_ref()
            .map(|accessor| {
                accessor
                    .secrets()
                    .map_err(|e| SealError::client_with("failed to obtain secrets", e))
            })
            .transpose()
    }
}

impl std::fmt::Debug for EnvelopeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCodec")
            .field("encryption_enabled", &self.secrets.is_some())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use crate::secrets::Secret;
    use fieldseal_common::BoxError;
    use proptest::prelude::*;

    fn raw_codec() -> EnvelopeCodec {
        let secret = Secret::raw_key(0, [0x42u8; KEY_LEN]).unwrap();
        EnvelopeCodec::with_secrets(SecretCollection::single(secret))
    }

    #[test]
    fn parse_splits_at_first_separator() {
        let env = Envelope::parse("x:a:b").unwrap();
        assert_eq!(env.code, "x");
        assert_eq!(env.payload, "a:b");
        assert_eq!(env.to_string(), "x:a:b");
        assert!(Envelope::parse("no separator").unwrap_err().is_crypto());
    }

    #[test]
    fn empty_or_absent_envelope_is_no_value() {
        let codec = raw_codec();
        assert_eq!(codec.decrypt(None, Some(0)).unwrap(), None);
        assert_eq!(codec.decrypt(Some(""), Some(0)).unwrap(), None);
        assert_eq!(EnvelopeCodec::plaintext().decrypt(Some(""), None).unwrap(), None);
    }

    #[test]
    fn missing_separator_is_crypto_error() {
        let err = raw_codec().decrypt(Some("garbage"), Some(0)).unwrap_err();
        assert!(err.is_crypto());
    }

    #[test]
    fn unknown_code_is_crypto_error() {
        let err = raw_codec().decrypt(Some("9:abc"), Some(0)).unwrap_err();
        assert!(err.is_crypto());
        assert!(err.message().contains("unknown cipher format"));
    }

    #[test]
    fn encrypted_value_without_secrets_is_crypto_error() {
        let enc = raw_codec().encrypt("hello").unwrap();
        let err = EnvelopeCodec::plaintext()
            .decrypt(Some(&enc.envelope), enc.secret_version)
            .unwrap_err();
        assert!(err.is_crypto());
        assert!(err.message().contains("no secret provided"));
    }

    #[test]
    fn raw_key_round_trip() {
        let codec = raw_codec();
        let enc = codec.encrypt("hello").unwrap();
        assert!(enc.envelope.starts_with("2:"));
        assert_eq!(enc.secret_version, Some(0));
        assert_eq!(
            codec.decrypt(Some(&enc.envelope), enc.secret_version).unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn missing_version_falls_back_to_zero() {
        let codec = raw_codec();
        let enc = codec.encrypt("legacy").unwrap();
        assert_eq!(codec.decrypt(Some(&enc.envelope), None).unwrap().as_deref(), Some("legacy"));
        assert_eq!(codec.decrypt(Some(&enc.envelope), Some(-3)).unwrap().as_deref(), Some("legacy"));
    }

    #[test]
    fn custom_key_with_builtin_cipher_is_client_error() {
        let secret = Secret::custom_key(0, b"opaque").unwrap();
        let codec = EnvelopeCodec::with_secrets(SecretCollection::single(secret));
        assert!(codec.encrypt("x").unwrap_err().is_client());
    }

    #[test]
    fn failing_accessor_is_client_error() {
        let accessor = || -> Result<SecretCollection, BoxError> { Err("vault sealed".into()) };
        let codec = EnvelopeCodec::new(Some(Arc::new(accessor)), vec![]).unwrap();

        let err = codec.encrypt("x").unwrap_err();
        assert!(err.is_client());
        let cause = std::error::Error::source(&err).unwrap();
        assert_eq!(cause.to_string(), "vault sealed");

        assert!(codec.decrypt(Some("2:AAAA"), Some(0)).unwrap_err().is_client());
    }

    #[test]
    fn plaintext_decrypt_never_touches_accessor() {
        let accessor = || -> Result<SecretCollection, BoxError> { Err("unreachable".into()) };
        let codec = EnvelopeCodec::new(Some(Arc::new(accessor)), vec![]).unwrap();
        assert_eq!(
            codec.decrypt(Some("pt:aGVsbG8="), None).unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn accessor_sees_rotation() {
        use std::sync::Mutex;

        let state = Arc::new(Mutex::new(
            SecretCollection::new(vec![Secret::raw_key(0, [1u8; KEY_LEN]).unwrap()], 0).unwrap(),
        ));
        let handle = Arc::clone(&state);
        let accessor = move || -> Result<SecretCollection, BoxError> {
            Ok(handle.lock().unwrap().clone())
        };
        let codec = EnvelopeCodec::new(Some(Arc::new(accessor)), vec![]).unwrap();

        let old = codec.encrypt("before").unwrap();
        assert_eq!(old.secret_version, Some(0));

        *state.lock().unwrap() = SecretCollection::new(
            vec![
                Secret::raw_key(0, [1u8; KEY_LEN]).unwrap(),
                Secret::raw_key(1, [2u8; KEY_LEN]).unwrap(),
            ],
            1,
        )
        .unwrap();

        let new = codec.encrypt("after").unwrap();
        assert_eq!(new.secret_version, Some(1));
        assert_eq!(
            codec.decrypt(Some(&old.envelope), old.secret_version).unwrap().as_deref(),
            Some("before")
        );
        assert_eq!(
            codec.decrypt(Some(&new.envelope), new.secret_version).unwrap().as_deref(),
            Some("after")
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_utf8_round_trips(text in any::<String>()) {
            let codec = raw_codec();
            let enc = codec.encrypt(&text).unwrap();
            let dec = codec.decrypt(Some(&enc.envelope), enc.secret_version).unwrap();
            prop_assert_eq!(dec.as_deref(), Some(text.as_str()));
        }

        #[test]
        fn plaintext_codec_round_trips(text in any::<String>()) {
            let codec = EnvelopeCodec::plaintext();
            let enc = codec.encrypt(&text).unwrap();
            prop_assert!(enc.envelope.starts_with("pt:"));
            prop_assert_eq!(enc.secret_version, None);
            let dec = codec.decrypt(Some(&enc.envelope), None).unwrap();
            prop_assert_eq!(dec.as_deref(), Some(text.as_str()));
        }
    }
}
