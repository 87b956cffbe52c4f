//! Safety gate.
//!
//! Suppression looks irreversible to the user, so the gate trades a few
//! missed ads for a hard guarantee against breaking page structure.
//! Checks run in order and short-circuit on the first failure.

pub mod errors;
pub mod loader;
pub mod ports;
pub mod types;
pub mod validator;

pub use errors::GateError;
pub use loader::load_limits;
pub use ports::{AutoConfirmer, Confirmer};
pub use types::{GateVerdict, SafetyLimits};
pub use validator::SafetyGate;
