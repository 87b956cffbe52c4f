use adshield_core_types::ShieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed exclusion import document; existing state is untouched.
    #[error("invalid exclusion format: {0}")]
    InvalidFormat(String),
}

impl From<EngineError> for ShieldError {
    fn from(value: EngineError) -> Self {
        ShieldError::new(value.to_string())
    }
}
