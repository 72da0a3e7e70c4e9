//! Error types for the tabrl core library

use thiserror::Error;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Action outside the valid set for a state
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// State key that does not decode to a state of the environment
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// `valid_actions` returned nothing for a state
    #[error("No valid actions for state {0}")]
    EmptyActionSet(String),

    /// Rejected configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// Algorithm that cannot run against the selected environment
    #[error("Algorithm {algorithm} is not supported by environment {environment}")]
    IncompatibleAlgorithm {
        /// Algorithm id
        algorithm: String,
        /// Environment id
        environment: String,
    },
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
