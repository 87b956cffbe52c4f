use adshield_core_types::ShieldError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ClassifierError {
    #[error("external scorer failed: {0}")]
    Scorer(String),
}

impl From<ClassifierError> for ShieldError {
    fn from(value: ClassifierError) -> Self {
        ShieldError::new(value.to_string())
    }
}
