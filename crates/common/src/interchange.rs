//! Secret interchange document consumed when building a secret collection
//! from configuration.
//!
//! ```json
//! {
//!   "currentVersion": 1,
//!   "secrets": [
//!     {"secret": "hunter2", "version": 0, "isKey": false, "isForCustomEncryption": false},
//!     {"secret": "<base64 of 32 bytes>", "version": 1, "isKey": true}
//!   ]
//! }
//! ```
//!
//! These types are plain serde carriers. Kind resolution, base64 decoding and
//! invariant checks happen in the engine when the document is converted into
//! a secret collection.

use serde::{Deserialize, Serialize};

/// Top-level secrets document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsDocument {
    /// Version of the secret used for new encryptions.
    pub current_version: i32,
    /// Every secret known to this deployment, current and historical.
    pub secrets: Vec<SecretEntry>,
}

/// A single secret in a [`SecretsDocument`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretEntry {
    /// Password text, or base64 when either flag is set.
    pub secret: String,
    pub version: i32,
    /// Entry is a base64-encoded 32-byte AES key.
    #[serde(default)]
    pub is_key: bool,
    /// Entry is base64-encoded material for a custom cipher.
    #[serde(default)]
    pub is_for_custom_encryption: bool,
}

impl std::fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEntry")
            .field("secret", &"[REDACTED]")
            .field("version", &self.version)
            .field("is_key", &self.is_key)
            .field("is_for_custom_encryption", &self.is_for_custom_encryption)
            .finish()
    }
}

impl SecretsDocument {
    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
