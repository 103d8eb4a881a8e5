//! Common types shared across `fieldseal` crates: the error type and the
//! secret interchange document.

pub mod error;
pub mod interchange;

pub use error::{BoxError, ErrorKind, SealError};
pub use interchange::{SecretEntry, SecretsDocument};
