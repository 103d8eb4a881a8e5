//! Round-trip self-test run on every custom cipher before registration.

use fieldseal_common::BoxError;
use thiserror::Error;

use super::CustomCipher;
use crate::crypto::cipher::random_key;
use crate::secrets::{Secret, SecretCollection};

/// Fixed plaintext used by [`self_test`]. Mixes ASCII, accented Latin, CJK and
/// an emoji so that byte/char confusion in a cipher shows up.
pub const SELF_TEST_PLAINTEXT: &str = "fieldseal self-test: Ünïcödé 世界 🔐 0123456789";

/// Why a custom cipher failed its self-test.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("encryption failed during self-test")]
    Encrypt(#[source] BoxError),

    #[error("decryption failed during self-test")]
    Decrypt(#[source] BoxError),

    #[error("decrypted value does not match the self-test plaintext")]
    Mismatch,
}

/// Encrypt [`SELF_TEST_PLAINTEXT`] with `cipher`, decrypt the result and
/// require a byte-for-byte match.
///
/// The key comes from `secrets` (see
/// [`SecretCollection::custom_key_for_validation`]); when there is none a
/// random 32-byte throwaway custom key is used.
pub fn self_test(
    cipher: &dyn CustomCipher,
    secrets: Option<&SecretCollection>,
) -> Result<(), ValidationError> {
    let throwaway;
    let secret = match secrets.and_then(SecretCollection::custom_key_for_validation) {
        Some(s) => s,
        None => {
            throwaway = Secret::custom_key(0, &random_key()[..])
                .map_err(|e| ValidationError::Encrypt(Box::new(e)))?;
            &throwaway
        }
    };

    let payload = cipher
        .encrypt(SELF_TEST_PLAINTEXT.as_bytes(), secret)
        .map_err(ValidationError::Encrypt)?;
    let decrypted = cipher
        .decrypt(payload.as_bytes(), secret)
        .map_err(ValidationError::Decrypt)?;

    if decrypted.as_bytes() != SELF_TEST_PLAINTEXT.as_bytes() {
        return Err(ValidationError::Mismatch);
    }
    Ok(())
}
