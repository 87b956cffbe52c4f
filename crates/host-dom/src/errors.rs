use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum HostError {
    /// Selector text the matcher cannot parse. Callers treat this as an
    /// empty match set.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}
