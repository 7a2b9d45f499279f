//! # Error Types
//!
//! A single error enum covers grid contract violations, GPU failures and
//! configuration problems. Grid errors are programming mistakes and surface
//! immediately; a failed dispatch only costs one generation.

use thiserror::Error;

/// Errors produced by the cell store, step engines and graphics plumbing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifeError {
    /// A grid was requested with a zero (or unrepresentably large) side
    #[error("invalid grid dimension {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// A coordinate query fell outside the grid
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A buffer of the wrong length was loaded into the store
    #[error("cell buffer length mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The compute kernel could not be launched or did not complete
    #[error("compute dispatch failed: {0}")]
    DispatchFailure(String),

    /// A shader module or pipeline failed validation
    #[error("shader '{label}' failed to compile or link: {message}")]
    CompileOrLinkFailure { label: String, message: String },

    /// No usable GPU adapter
    #[error("adapter error: {0}")]
    Adapter(String),

    /// Device creation or device loss
    #[error("device error: {0}")]
    Device(String),

    /// Surface creation, configuration or acquisition failed
    #[error("surface error: {0}")]
    Surface(String),

    /// Malformed configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, LifeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = LifeError::OutOfRange {
            x: 7,
            y: 2,
            width: 5,
            height: 5,
        };
        assert_eq!(err.to_string(), "cell (7, 2) is outside the 5x5 grid");

        let err = LifeError::CompileOrLinkFailure {
            label: "step.wgsl".into(),
            message: "unknown identifier".into(),
        };
        assert!(err.to_string().contains("step.wgsl"));
    }
}
