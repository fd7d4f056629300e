//! Error types for the MPP core.
//!
//! Only setup paths are fallible in the `Result` sense. Runtime failures on
//! the wire (send failures, malformed payloads, rejected commits) are
//! reported as booleans or outcome values and never surface here.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MppError {
    #[error("Failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Invalid configuration value for {field}: {reason}")]
    ConfigValue {
        field: &'static str,
        reason: &'static str,
    },
}

pub type MppResult<T> = Result<T, MppError>;
