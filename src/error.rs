use thiserror::Error;

/// Result type for copa-dqn operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the training core
#[derive(Debug, Error)]
pub enum DqnError {
    /// A batch was requested before the replay buffer held enough transitions
    #[error("Insufficient buffer: {available} valid transitions, {requested} requested")]
    InsufficientBuffer { available: usize, requested: usize },

    /// Observation, action or parameter shapes disagree with the constructed network
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Action index outside the discrete action space
    #[error("Invalid action {action}: must be less than {n}")]
    InvalidAction { action: usize, n: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Numerical computation errors (NaN value estimates)
    #[error("Numerical error: {0}")]
    Numerical(String),

    /// `backward_batch` was called on a layer that never ran `forward_batch`
    #[error("Backward pass requested before a forward pass")]
    MissingForwardPass,

    /// The action space has no actions to sample from
    #[error("Cannot sample from an empty action space")]
    EmptyActionSpace,

    /// Failure reported by the environment boundary
    #[error("Environment error: {0}")]
    Environment(String),

    /// IO errors (checkpoint and record files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary or JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// YAML configuration errors
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Training record export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn shape_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
