//! Tracing subscriber initialisation.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Level applied to dependencies when only `LOG_LEVEL` is configured.
const DEPENDENCY_LEVEL: &str = "warn";

/// Filter directives for `log_level`: the `fieldseal` targets (library and
/// binary) log at `log_level`, everything else at [`DEPENDENCY_LEVEL`].
fn default_directives(log_level: &str) -> String {
    format!("{DEPENDENCY_LEVEL},fieldseal={log_level}")
}

/// Initialise the global tracing subscriber.
///
/// Outputs structured JSON logs to stdout. `RUST_LOG`, when set, replaces the
/// directives built from `log_level`.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid level or a global
/// subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(log_level))
            .map_err(|e| anyhow::anyhow!("invalid LOG_LEVEL '{log_level}': {e}"))?,
    };

    tracing_subscriber::fmt()
        .json()
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
