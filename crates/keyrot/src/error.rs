//! Error types for key rotation.

use thiserror::Error;

/// Errors that can occur while configuring a manager or minting keys.
#[derive(Debug, Error)]
pub enum KeyrotError {
    /// Retain limit must allow at least one key and fit in a u32
    #[error("Invalid retain limit: {0} (must be between 1 and 4294967295)")]
    InvalidLimit(usize),

    /// Keys must be valid for a non-zero duration
    #[error("Invalid validity duration: must be greater than zero")]
    InvalidDuration,

    /// Keys must carry at least one bit of entropy
    #[error("Invalid entropy bits: {0} (must be at least 1)")]
    InvalidBits(usize),

    /// The secure randomness source could not supply bytes
    #[error("Unable to generate auth key: {0}")]
    Entropy(#[from] rand::Error),
}

/// Result type alias for key rotation operations.
pub type Result<T> = std::result::Result<T, KeyrotError>;
