use thiserror::Error;

/// Top-level error type for the InkCalc service.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("vision model error ({provider}): {message}")]
    ModelService { provider: String, message: String },

    #[error("processing failed: {0}")]
    Processing(String),

    #[error("configuration error: {0}")]
    Config(String),
}
