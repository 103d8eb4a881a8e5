//! Common error type shared across crates.

use thiserror::Error;

/// Boxed, thread-safe error used to carry causes from pluggable components
/// (custom ciphers, secrets accessors) that live outside this workspace.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a [`SealError`].
///
/// Both kinds are terminal: nothing in the engine retries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Misuse or misconfiguration by the caller.
    Client,
    /// A cryptographic operation failed at run time.
    Crypto,
}

/// Top-level error type returned by every public engine operation.
///
/// - [`SealError::Client`]: malformed secrets, invalid custom cipher
///   registration, unknown secret version, failing secrets accessor.
/// - [`SealError::Crypto`]: unparseable envelope, unknown cipher code,
///   authentication failure, unavailable primitive.
#[derive(Debug, Error)]
pub enum SealError {
    /// The caller supplied invalid configuration or used the API incorrectly.
    #[error("client error: {message}")]
    Client {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Encryption, decryption or envelope parsing failed.
    #[error("crypto error: {message}")]
    Crypto {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl SealError {
    /// A [`SealError::Client`] without an underlying cause.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    /// A [`SealError::Client`] wrapping `source`.
    pub fn client_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Client {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// A [`SealError::Crypto`] without an underlying cause.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
            source: None,
        }
    }

    /// A [`SealError::Crypto`] wrapping `source`.
    pub fn crypto_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Crypto {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::Client { .. } => ErrorKind::Client,
            SealError::Crypto { .. } => ErrorKind::Crypto,
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            SealError::Client { message, .. } | SealError::Crypto { message, .. } => message,
        }
    }

    pub fn is_client(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    pub fn is_crypto(&self) -> bool {
        self.kind() == ErrorKind::Crypto
    }
}
