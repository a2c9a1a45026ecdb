//! Error types for simulation setup.

use thiserror::Error;

/// Errors encountered while building a simulated board.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Board configuration rejected: {message}")]
    Config { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<hp_controls::ControlError> for SimError {
    fn from(e: hp_controls::ControlError) -> Self {
        SimError::Config {
            message: e.to_string(),
        }
    }
}
