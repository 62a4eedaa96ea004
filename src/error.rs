//! Error types for runflux

use thiserror::Error;

/// Errors that abort the cleaning pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing required field `{field}` on sample {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("Failed to decode FIT file: {0}")]
    FitParse(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl PipelineError {
    /// True when the recording lacks the base columns the pipeline needs
    pub fn is_unsupported_recording(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingField { .. }
                | PipelineError::FitParse(_)
                | PipelineError::UnsupportedFormat(_)
        )
    }
}
