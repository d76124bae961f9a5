//! Error types for irqlab.
//!
//! Navigation outside the step catalog and re-entrant starts are not errors;
//! those are reported as `false` from the operation. Everything that can
//! actually fail returns `Result<T, LabError>`.

use thiserror::Error;

/// Result type alias for irqlab operations.
pub type LabResult<T> = Result<T, LabError>;

/// Unified error type for all irqlab operations.
#[derive(Debug, Error)]
pub enum LabError {
    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Simulation Errors =====
    /// Speed multiplier was zero, negative or not finite.
    #[error("Invalid speed multiplier {0}: must be finite and greater than zero")]
    InvalidSpeed(f64),

    /// A phase addressed a memory slot that does not exist.
    #[error("Memory slot {index} out of range (bank has {len} slots)")]
    MemorySlot {
        /// Requested slot.
        index: usize,
        /// Number of slots in the bank.
        len: usize,
    },

    /// A timed phase failed.
    #[error("Phase failed: {0}")]
    Phase(String),

    /// Async runtime could not be created.
    #[error("Runtime error: {0}")]
    Runtime(String),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LabError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a phase failure.
    #[must_use]
    pub fn phase(message: impl Into<String>) -> Self {
        Self::Phase(message.into())
    }
}
