//! Error types for the sequence_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for sequence_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request is malformed or contradicts itself (e.g. required and excluded)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested duration cannot hold the fixed session sections
    #[error(
        "Requested duration of {requested_minutes} min is too short; minimum viable duration is {minimum_minutes} min"
    )]
    DurationTooShort {
        requested_minutes: u32,
        minimum_minutes: u32,
    },

    /// Filtered candidate pool cannot fill the session
    #[error(
        "Insufficient candidates: {needed} movements needed, {available} available (short by {shortfall})"
    )]
    InsufficientCandidates {
        needed: usize,
        available: usize,
        shortfall: usize,
    },

    /// Safety findings survived repair and the configured policy rejects them
    #[error(
        "Plan rejected: {overlap_failures} overlap failure(s), {progression_violations} progression violation(s)"
    )]
    UnsafePlan {
        overlap_failures: usize,
        progression_violations: usize,
    },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Report rendering error
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}
