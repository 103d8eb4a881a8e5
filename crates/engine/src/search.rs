//! Deterministic, salted SHA-256 hashing of searchable field values.
//!
//! The server stores `hash(value)` next to the encrypted value so equality
//! queries work without revealing plaintext. The salt is the deployment's
//! environment identifier, not a per-call random value, and no secret material
//! is involved.

use sha2::{Digest, Sha256};

/// Hash `value` for equality search.
///
/// Computes `hex(sha256(v + ":" + salt))` where `v` is `value`, lowercased
/// when `normalize_case` is set. Returns `None` for `None`.
pub fn hash(value: Option<&str>, salt: &str, normalize_case: bool) -> Option<String> {
    let value = value?;
    let mut hasher = Sha256::new();
    if normalize_case {
        hasher.update(value.to_lowercase().as_bytes());
    } else {
        hasher.update(value.as_bytes());
    }
    hasher.update(b":");
    hasher.update(salt.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// [`hash`] bound to one environment's salt and case policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKeyHasher {
    salt: String,
    normalize_case: bool,
}

impl SearchKeyHasher {
    pub fn new(salt: impl Into<String>, normalize_case: bool) -> Self {
        Self {
            salt: salt.into(),
            normalize_case,
        }
    }

    pub fn hash(&self, value: Option<&str>) -> Option<String> {
        hash(value, &self.salt, self.normalize_case)
    }

    pub fn normalize_case(&self) -> bool {
        self.normalize_case
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "env-1";
    const LOWER: &str = "4bffe7751117bfe77d5bb030e814c8839064d19d316a732ff58102fff570b745";

    #[test]
    fn known_vector() {
        assert_eq!(hash(Some("abc"), SALT, false).as_deref(), Some(LOWER));
    }

    #[test]
    fn normalisation_folds_case() {
        for v in ["AbC", "abc", "ABC"] {
            assert_eq!(hash(Some(v), SALT, true).as_deref(), Some(LOWER));
        }
    }

    #[test]
    fn case_sensitive_without_normalisation() {
        assert_eq!(
            hash(Some("AbC"), SALT, false).as_deref(),
            Some("9f0103b6893a392050eccce4233d792194471f960e0e52b2755075fb54f50526")
        );
        assert_eq!(
            hash(Some("ABC"), SALT, false).as_deref(),
            Some("0f17671a18ca40c1efc3c54eefd92f4421b14819b8834977914379f4a4cd80d0")
        );
    }

    #[test]
    fn none_in_none_out() {
        assert_eq!(hash(None, SALT, true), None);
        assert_eq!(hash(None, SALT, false), None);
    }

    #[test]
    fn salt_separates_environments() {
        assert_ne!(hash(Some("abc"), "env-1", false), hash(Some("abc"), "env-2", false));
    }

    #[test]
    fn hasher_applies_policy() {
        let hasher = SearchKeyHasher::new(SALT, true);
        assert!(hasher.normalize_case());
        assert_eq!(hasher.hash(Some("ABC")).as_deref(), Some(LOWER));
        assert_eq!(hasher.hash(None), None);

        let output = hasher.hash(Some("")).unwrap();
        assert_eq!(output.len(), 64);
        assert!(output.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
