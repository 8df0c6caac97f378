//! Error type shared by matrix construction, parameter resolution and config loading.

/// Errors raised while building a model. All of them surface before any
/// patient is simulated.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },
    #[error("Division by zero: transition counts for state {state} sum to zero (row {row:?})")]
    DivisionByZero { state: usize, row: Vec<u64> },
    #[error("Config error: {0}")]
    Config(String),
}

impl ModelError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter { reason: reason.into() }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Config(e.to_string())
    }
}

impl From<csv::Error> for ModelError {
    fn from(e: csv::Error) -> Self {
        ModelError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
