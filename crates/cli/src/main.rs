//! `fieldseal`: one-shot encrypt / decrypt / search-hash tool.
//!
//! Usage:
//!
//! ```text
//! fieldseal encrypt <plaintext>
//! fieldseal decrypt <envelope> [secret_version]
//! fieldseal hash <value>
//! ```
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Build the codec and search hasher, then run the command.

use anyhow::{Context, Result};
use fieldseal::Config;
use tracing::info;

const USAGE: &str =
    "usage: fieldseal <encrypt <plaintext> | decrypt <envelope> [secret_version] | hash <value>>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Encrypt(String),
    Decrypt {
        envelope: String,
        secret_version: Option<i32>,
    },
    Hash(String),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [cmd, value] if cmd == "encrypt" => Ok(Command::Encrypt(value.clone())),
            [cmd, value] if cmd == "hash" => Ok(Command::Hash(value.clone())),
            [cmd, envelope] if cmd == "decrypt" => Ok(Command::Decrypt {
                envelope: envelope.clone(),
                secret_version: None,
            }),
            [cmd, envelope, version] if cmd == "decrypt" => Ok(Command::Decrypt {
                envelope: envelope.clone(),
                secret_version: Some(
                    version
                        .parse()
                        .with_context(|| format!("invalid secret version '{version}'"))?,
                ),
            }),
            _ => anyhow::bail!(USAGE),
        }
    }
}

fn run(cfg: &Config, command: Command) -> Result<String> {
    match command {
        Command::Encrypt(plaintext) => {
            let encrypted = cfg.build_codec()?.encrypt(&plaintext)?;
            let version = encrypted
                .secret_version
                .map_or_else(|| "-".to_owned(), |v| v.to_string());
            Ok(format!("{}\t{version}", encrypted.envelope))
        }
        Command::Decrypt {
            envelope,
            secret_version,
        } => Ok(cfg
            .build_codec()?
            .decrypt(Some(&envelope), secret_version)?
            .unwrap_or_default()),
        Command::Hash(value) => Ok(cfg.search_hasher().hash(Some(&value)).unwrap_or_default()),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args).map_err(|e| {
        eprintln!("ERROR: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: fieldseal configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    fieldseal::telemetry::init(&cfg.log_level)?;
    info!(
        encryption_enabled = cfg.encryption_enabled,
        normalize_keys = cfg.normalize_keys,
        "fieldseal starting"
    );

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    let output = run(&cfg, command).map_err(|e| {
        eprintln!("ERROR: {e:#}");
        e
    })?;
    println!("{output}");
    Ok(())
}
