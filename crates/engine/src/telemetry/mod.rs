//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, secret material or envelope payload** may appear in any
//!   log field. Only cipher codes, secret versions and error messages are
//!   logged.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   overrides it.

pub mod init;

pub use init::init;
