//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
///
/// Fatal to the operation that needed the value, never to the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at `{0}`")]
    NotFound(PathBuf),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file `{0}` is not a valid registry document")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("invalid interval `{0}` (expected a number with optional s/m/h suffix)")]
    InvalidInterval(String),
}
