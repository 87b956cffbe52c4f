use adshield_core_types::ShieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<PatternError> for ShieldError {
    fn from(value: PatternError) -> Self {
        ShieldError::new(value.to_string())
    }
}
