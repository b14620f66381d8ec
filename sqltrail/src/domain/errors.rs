//! Structured error types for sqltrail
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! The tracking hot path never returns errors; these cover configuration
//! loading and the inspector surface.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid {name} thresholds: fast ({fast}) must not exceed medium ({medium})")]
    InvalidThresholds { name: &'static str, fast: String, medium: String },
}

#[derive(Error, Debug)]
pub enum InspectorError {
    #[error("Failed to render inspector page: {0}")]
    RenderFailed(#[from] minijinja::Error),

    #[error("Failed to serialize raw document: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to bind inspector on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
