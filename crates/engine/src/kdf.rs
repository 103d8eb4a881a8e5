//! PBKDF2-HMAC-SHA-512 key derivation for password-class secrets.
//!
//! Only [`SecretKind::Password`](crate::secrets::SecretKind::Password) secrets
//! go through this step. A fresh [`SALT_LEN`]-byte salt is drawn from the OS
//! CSPRNG for every encryption and stored in the ciphertext frame, so the same
//! password never yields the same AES key twice.

use hmac::Hmac;
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::crypto::cipher::CipherError;

/// PBKDF2 iteration count used by the built-in AEAD ciphers.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Length of the per-encryption KDF salt.
pub const SALT_LEN: usize = 64;

/// Length of the derived AES-256 key.
pub const DERIVED_KEY_LEN: usize = 32;

/// Derive `output_len` bytes of key material from `password` and `salt`.
///
/// The returned buffer is zeroed on drop.
///
/// # Errors
///
/// Returns [`CipherError::KeyDerivation`] if `iterations` or `output_len` is
/// zero, or if the PBKDF2 primitive rejects its inputs.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if iterations == 0 {
        return Err(CipherError::KeyDerivation("iteration count must be > 0".into()));
    }
    if output_len == 0 {
        return Err(CipherError::KeyDerivation("output length must be > 0".into()));
    }
    let mut out = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2::pbkdf2::<Hmac<Sha512>>(password, salt, iterations, &mut out)
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
    Ok(out)
}

/// Derive an AES-256 key with the fixed built-in parameters.
pub fn derive_aes_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; DERIVED_KEY_LEN]>, CipherError> {
    let derived = derive(password, salt, PBKDF2_ITERATIONS, DERIVED_KEY_LEN)?;
    let mut key = Zeroizing::new([0u8; DERIVED_KEY_LEN]);
    key.copy_from_slice(&derived);
    Ok(key)
}
