//! Error types for the storage, site and configuration layers.
//!
//! The metrics layer has no error type: it always produces a result.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or writing a site store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialise store: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Failure creating or discovering site stores.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Site name cannot be empty")]
    EmptyName,

    #[error("Site '{0}' already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
