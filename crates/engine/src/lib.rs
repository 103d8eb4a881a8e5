//! `fieldseal`: envelope encryption for individual field values.
//!
//! Values are stored as `"<code>:<payload>"` envelopes together with the
//! version of the secret that produced them. Built-in ciphers cover plaintext
//! passthrough (`pt`), the legacy hex AES-GCM format (`1`) and the current
//! base64 AES-GCM format (`2`); integrators can register their own ciphers.
//!
//! Entry points:
//! - [`EnvelopeCodec`] encrypts and decrypts values.
//! - [`SecretCollection`] holds the versioned secrets.
//! - [`SearchKeyHasher`] derives deterministic search keys.
//! - [`Config`] builds both from environment variables.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod kdf;
pub mod registry;
pub mod search;
pub mod secrets;
pub mod telemetry;

pub use codec::{Encrypted, Envelope, EnvelopeCodec};
pub use config::Config;
pub use crypto::{BuiltinCipher, CipherError};
pub use fieldseal_common::{BoxError, ErrorKind, SealError};
pub use registry::{CipherRegistry, CustomCipher, ResolvedCipher};
pub use search::SearchKeyHasher;
pub use secrets::{Secret, SecretCollection, SecretError, SecretKind, SecretsAccessor};
