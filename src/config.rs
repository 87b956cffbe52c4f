//! Application configuration.
//!
//! One flat YAML file carries both the safety limits (top level) and
//! the scan cadence (`scan:` section); either may be omitted.

use std::fs;
use std::path::Path;

use anyhow::Context;

use adshield_safety_gate::{load_limits, SafetyLimits};
use adshield_scan_scheduler::ScanConfig;

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub safety: SafetyLimits,
    pub scan: ScanConfig,
}

impl AppConfig {
    /// Defaults when no path is given or the file does not exist;
    /// malformed content is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let safety = load_limits(path).context("loading safety limits")?;
        let scan = match path {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let doc: serde_yaml::Value =
                    serde_yaml::from_str(&raw).context("parsing config file")?;
                match doc.get("scan") {
                    Some(section) => serde_yaml::from_value(section.clone())
                        .context("parsing scan section")?,
                    None => ScanConfig::default(),
                }
            }
            _ => ScanConfig::default(),
        };
        Ok(Self { safety, scan })
    }
}
