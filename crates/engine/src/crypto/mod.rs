//! Built-in field ciphers and their AES-256-GCM framing.
//!
//! This module is free of registry and codec concerns. It provides the
//! low-level seal/open operations and the three fixed cipher codes.
//!
//! # Envelope payload framing
//!
//! ```text
//! salt (64 B) || iv (12 B) || ciphertext || tag (16 B)
//! ```
//!
//! Code `"1"` carries that frame hex-encoded, code `"2"` base64-encoded, and
//! code `"pt"` carries the unencrypted UTF-8 bytes base64-encoded.

pub mod cipher;
pub mod suite;

pub use cipher::{CipherError, KEY_LEN};
pub use suite::BuiltinCipher;
