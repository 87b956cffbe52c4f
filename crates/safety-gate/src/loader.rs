use std::fs;
use std::path::Path;

use crate::errors::GateError;
use crate::types::SafetyLimits;

/// Load safety limits from a YAML file; defaults when no path is given
/// or the file does not exist. Unknown or malformed content is an error
/// rather than a silent fallback: running with half-parsed safety
/// limits is worse than not starting.
pub fn load_limits(path: Option<&Path>) -> Result<SafetyLimits, GateError> {
    let Some(path) = path else {
        return Ok(SafetyLimits::default());
    };
    if !path.exists() {
        return Ok(SafetyLimits::default());
    }
    let raw = fs::read_to_string(path).map_err(|err| GateError::Io(err.to_string()))?;
    let limits: SafetyLimits =
        serde_yaml::from_str(&raw).map_err(|err| GateError::Invalid(err.to_string()))?;
    if limits.min_content_ratio <= 0.0 || limits.min_content_ratio > 1.0 {
        return Err(GateError::Invalid(format!(
            "min_content_ratio {} out of (0, 1]",
            limits.min_content_ratio
        )));
    }
    Ok(limits)
}
