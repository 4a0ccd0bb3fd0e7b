use thiserror::Error;

use super::Amount;

/// Failures raised while adjusting or synthesizing a single forecast day.
/// None of these are fatal for a run; the synthesizer drops the offending day.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate draw range: {remaining} remaining over {divisor} pieces")]
    DegenerateRange { remaining: Amount, divisor: i64 },

    #[error("Missing field: {field}")]
    MissingField { field: String },
}

impl SynthesisError {
    pub fn missing(field: impl Into<String>) -> Self {
        SynthesisError::MissingField {
            field: field.into(),
        }
    }
}
