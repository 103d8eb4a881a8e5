//! [`SecretCollection`]: every known secret plus the one used for new
//! encryptions.

use std::{collections::HashSet, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fieldseal_common::{SecretEntry, SecretsDocument};

use super::{Secret, SecretError, SecretKind};

/// Immutable, cheaply cloneable set of versioned secrets.
///
/// Invariants, checked once at construction:
/// - the set is non-empty;
/// - versions are unique;
/// - the current version is a member of the set.
///
/// Clones share the same backing allocation, so a collection can be handed to
/// many threads without locking.
#[derive(Clone, Debug)]
pub struct SecretCollection {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    secrets: Vec<Secret>,
    current: usize,
}

impl SecretCollection {
    /// Build a collection from `secrets`, designating `current_version` as
    /// current. Insertion order is preserved.
    ///
    /// # Errors
    ///
    /// [`SecretError::EmptyCollection`], [`SecretError::DuplicateVersion`] or
    /// [`SecretError::CurrentVersionMissing`].
    pub fn new(secrets: Vec<Secret>, current_version: i32) -> Result<Self, SecretError> {
        if secrets.is_empty() {
            return Err(SecretError::EmptyCollection);
        }
        let mut seen = HashSet::with_capacity(secrets.len());
        for s in &secrets {
            if !seen.insert(s.version()) {
                return Err(SecretError::DuplicateVersion(s.version()));
            }
        }
        let current = secrets
            .iter()
            .position(|s| s.version() == current_version)
            .ok_or(SecretError::CurrentVersionMissing(current_version))?;
        Ok(Self {
            inner: Arc::new(Inner { secrets, current }),
        })
    }

    /// A collection holding one secret, which is current.
    pub fn single(secret: Secret) -> Self {
        Self {
            inner: Arc::new(Inner {
                secrets: vec![secret],
                current: 0,
            }),
        }
    }

    /// A collection holding one password secret at version 0.
    pub fn from_password(password: &str) -> Result<Self, SecretError> {
        Ok(Self::single(Secret::password(0, password)?))
    }

    /// Parse the JSON interchange document and build a collection from it.
    pub fn from_json(json: &str) -> Result<Self, SecretError> {
        let doc = SecretsDocument::from_json(json)
            .map_err(|e| SecretError::InvalidDocument(e.to_string()))?;
        Self::try_from(doc)
    }

    /// The secret used for new encryptions.
    pub fn current(&self) -> &Secret {
        &self.inner.secrets[self.inner.current]
    }

    /// Look up a secret by version.
    pub fn get(&self, version: i32) -> Option<&Secret> {
        self.inner.secrets.iter().find(|s| s.version() == version)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Secret> {
        self.inner.secrets.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.secrets.len()
    }

    /// Always `false`; kept for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.inner.secrets.is_empty()
    }

    /// Key material suitable for validating a custom cipher: the current
    /// secret when it is a custom key, otherwise the lowest-versioned custom
    /// key.
    pub fn custom_key_for_validation(&self) -> Option<&Secret> {
        let current = self.current();
        if current.kind() == SecretKind::CustomKey {
            return Some(current);
        }
        self.inner
            .secrets
            .iter()
            .filter(|s| s.kind() == SecretKind::CustomKey)
            .min_by_key(|s| s.version())
    }
}

impl TryFrom<SecretsDocument> for SecretCollection {
    type Error = SecretError;

    fn try_from(doc: SecretsDocument) -> Result<Self, Self::Error> {
        let secrets = doc
            .secrets
            .iter()
            .map(secret_from_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(secrets, doc.current_version)
    }
}

fn secret_from_entry(entry: &SecretEntry) -> Result<Secret, SecretError> {
    match (entry.is_key, entry.is_for_custom_encryption) {
        (true, true) => Err(SecretError::ConflictingFlags {
            version: entry.version,
        }),
        (true, false) => Secret::raw_key(entry.version, decode(entry)?.as_slice()),
        (false, true) => Secret::custom_key(entry.version, decode(entry)?.as_slice()),
        (false, false) => Secret::password(entry.version, entry.secret.as_bytes()),
    }
}

fn decode(entry: &SecretEntry) -> Result<zeroize::Zeroizing<Vec<u8>>, SecretError> {
    STANDARD
        .decode(entry.secret.as_bytes())
        .map(zeroize::Zeroizing::new)
        .map_err(|e| SecretError::InvalidEncoding {
            version: entry.version,
            reason: e.to_string(),
        })
}
