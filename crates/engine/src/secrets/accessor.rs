//! Supplying secrets to the codec, possibly lazily.

use fieldseal_common::BoxError;

use super::SecretCollection;

/// Source of the [`SecretCollection`] used for a single encrypt or decrypt.
///
/// The codec asks for secrets on every operation, so an implementation may
/// fetch them lazily or refresh them after rotation. Errors are wrapped by the
/// codec into a client error.
pub trait SecretsAccessor: Send + Sync {
    fn secrets(&self) -> Result<SecretCollection, BoxError>;
}

impl SecretsAccessor for SecretCollection {
    fn secrets(&self) -> Result<SecretCollection, BoxError> {
        Ok(self.clone())
    }
}

impl<F> SecretsAccessor for F
where
    F: Fn() -> Result<SecretCollection, BoxError> + Send + Sync,
{
    fn secrets(&self) -> Result<SecretCollection, BoxError> {
        self()
    }
}
