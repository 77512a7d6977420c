//! Error types for the onboarding subsystem.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Step registry defects. These are configuration bugs detected at startup,
/// never runtime conditions to recover from.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Step registry is empty")]
    Empty,

    #[error("Step {step} is declared out of order (expected step {expected})")]
    OutOfOrder { step: u32, expected: u32 },

    #[error("Flow declares {declared} steps but the registry covers {covered}")]
    TotalMismatch { declared: u32, covered: u32 },

    #[error("Step {step} has an empty screen route")]
    EmptyRoute { step: u32 },

    #[error("Critical step {step} declares no data to persist")]
    CriticalWithoutData { step: u32 },

    #[error("Critical step {step} is not a registered step")]
    UnknownCriticalStep { step: u32 },
}

/// Remote Progress Service errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("Request to {endpoint} failed with HTTP {status}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Transport error calling {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Request to {endpoint} was rejected: {message}")]
    Rejected { endpoint: String, message: String },

    #[error("Failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Local store errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Controller-level failures surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Step {step} has no data to save yet")]
    NothingToSave { step: u32 },

    #[error("Submission failed: {0}")]
    Submission(#[from] ApiError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
