use adshield_core_types::ShieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid safety limits: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<GateError> for ShieldError {
    fn from(value: GateError) -> Self {
        ShieldError::new(value.to_string())
    }
}
