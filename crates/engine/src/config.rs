//! Configuration loading and validation.
//!
//! All values are read from environment variables. Binaries should exit with
//! a clear error message if any required variable is missing or invalid.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::codec::EnvelopeCodec;
use crate::search::SearchKeyHasher;
use crate::secrets::{SecretCollection, SecretsAccessor};

/// Validated engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to a secrets interchange JSON document.
    pub secrets_file: Option<String>,

    /// A single password secret (version 0). Mutually exclusive with
    /// `secrets_file`.
    pub secrets_password: Option<String>,

    /// When `false`, no secrets are loaded and values are stored with the
    /// plaintext cipher.
    #[serde(default = "default_encryption_enabled")]
    pub encryption_enabled: bool,

    /// Salt for search-key hashing, normally the environment identifier.
    /// **Required.**
    pub environment_id: String,

    /// Lowercase values before search-key hashing.
    #[serde(default)]
    pub normalize_keys: bool,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_encryption_enabled() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.environment_id, "ENVIRONMENT_ID")?;

        match (&self.secrets_file, &self.secrets_password) {
            (Some(_), Some(_)) => {
                anyhow::bail!("SECRETS_FILE and SECRETS_PASSWORD are mutually exclusive")
            }
            (None, None) if self.encryption_enabled => anyhow::bail!(
                "ENCRYPTION_ENABLED is true but neither SECRETS_FILE nor SECRETS_PASSWORD is set"
            ),
            (Some(path), None) => ensure_non_empty(path, "SECRETS_FILE")?,
            (None, Some(password)) => ensure_non_empty(password, "SECRETS_PASSWORD")?,
            (None, None) => {}
        }
        Ok(())
    }

    /// Read the configured secrets.
    ///
    /// Returns `Ok(None)` when encryption is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the secrets file cannot be read or the secrets
    /// violate a collection invariant.
    pub fn load_secrets(&self) -> Result<Option<SecretCollection>> {
        if !self.encryption_enabled {
            return Ok(None);
        }
        let collection = if let Some(path) = &self.secrets_file {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read secrets file {path}"))?;
            SecretCollection::from_json(&json)
                .with_context(|| format!("invalid secrets file {path}"))?
        } else if let Some(password) = &self.secrets_password {
            SecretCollection::from_password(password).context("invalid SECRETS_PASSWORD")?
        } else {
            anyhow::bail!("no secrets source configured");
        };
        Ok(Some(collection))
    }

    /// Build a codec over the configured secrets and the built-in ciphers.
    pub fn build_codec(&self) -> Result<EnvelopeCodec> {
        let accessor = self
            .load_secrets()?
            .map(|c| Arc::new(c) as Arc<dyn SecretsAccessor>);
        EnvelopeCodec::new(accessor, Vec::new()).context("failed to build envelope codec")
    }

    pub fn search_hasher(&self) -> SearchKeyHasher {
        SearchKeyHasher::new(self.environment_id.clone(), self.normalize_keys)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
