use serde::{Deserialize, Serialize};

/// Process-wide safety limits. Not persisted; reset each session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyLimits {
    pub max_blocks_per_page: u32,
    /// Fraction of the viewport area above which suppression needs
    /// interactive confirmation.
    pub min_content_ratio: f64,
    /// Semantic landmarks that must never be suppressed.
    pub critical_selectors: Vec<String>,
    /// Class-name substrings (case-insensitive) that trigger a
    /// confirmation prompt.
    pub unsafe_classes: Vec<String>,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_blocks_per_page: 50,
            min_content_ratio: 0.3,
            critical_selectors: [
                "main",
                "article",
                "header",
                "footer",
                "nav",
                r#"[role="main"]"#,
                r#"[role="article"]"#,
                r#"[role="navigation"]"#,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            unsafe_classes: [
                "container",
                "wrapper",
                "content",
                "main",
                "page",
                "site-content",
                "main-content",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Outcome of a gate evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateVerdict {
    pub allowed: bool,
    /// Populated on rejection; also surfaced as a notice.
    pub reason: Option<String>,
}

impl GateVerdict {
    pub fn pass() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
