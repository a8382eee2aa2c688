//! @ai:module:intent Define error types for the Doxygen to LOBSTER converter
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all fatal converter failures
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No doxygen tree found in {0}")]
    InputNotFound(PathBuf),

    #[error("Invalid doxygen tree in {path}: {source}")]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tag collision: '{tag}' is produced by both {first} and {second}")]
    TagCollision {
        tag: String,
        first: String,
        second: String,
    },

    #[error("{count} rule violation(s) found, no output written")]
    RuleViolation { count: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
