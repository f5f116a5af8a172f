//! Defines the custom error types for the dkim-gate library.

use std::io;
use thiserror::Error;

/// The primary error type for the verification pipeline surface.
///
/// Engine-level verdicts never appear here: they are absorbed by the
/// verification stream and converted into a
/// [`VerificationOutcome`](crate::VerificationOutcome). This type only
/// covers the faults a caller can actually act on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing the TOML configuration file.
    #[error("TOML Error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
