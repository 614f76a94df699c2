//! Error types for pendulum_lqr

use thiserror::Error;

/// Main error type for controller construction, re-linearization and the driver
#[derive(Debug, Error)]
pub enum LqrError {
    /// Matrix or vector shape mismatch
    #[error("Dimension error: {what} is {actual}, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: String,
        actual: String,
    },
    /// The Riccati equation has no stabilizing solution
    #[error("Solver error: {0}")]
    Solver(String),
    /// Invalid physical parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration loading or validation failed
    #[error("Config error: {0}")]
    Config(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed setpoint text
    #[error(transparent)]
    InputParse(#[from] InputParseError),
    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl LqrError {
    pub(crate) fn dimension(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        LqrError::Dimension {
            what,
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}

/// Setpoint text that could not be read as an angle in degrees.
///
/// Recovered by the driver: the input is discarded and the prior setpoint stays.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid setpoint input {input:?}: please enter a number")]
pub struct InputParseError {
    pub input: String,
}

/// Result type alias for controller operations
pub type LqrResult<T> = Result<T, LqrError>;
