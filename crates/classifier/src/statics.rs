//! Static keyword fragments and suspicious-domain patterns.
//!
//! These back the classifier before any patterns have been learned and
//! keep catching lightly-obfuscated names afterwards: a fragment counts
//! when it appears *inside* a token, so `xX_banner_42` still matches.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fragments associated with injected ad content.
pub const AD_KEYWORD_FRAGMENTS: &[&str] = &[
    "advert",
    "adsense",
    "adsbygoogle",
    "adslot",
    "adbox",
    "banner",
    "billboard",
    "doubleclick",
    "outbrain",
    "popunder",
    "popup",
    "promo",
    "sponsor",
    "taboola",
];

/// Hostname patterns of known ad/tracking networks.
pub static SUSPICIOUS_DOMAIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"doubleclick\.net$",
        r"googlesyndication\.com$",
        r"googleadservices\.com$",
        r"adservice\.google\.",
        r"adnxs\.com$",
        r"adsystem\.",
        r"taboola\.com$",
        r"outbrain\.com$",
        r"criteo\.",
        r"popads\.",
        r"moatads\.com$",
        r"scorecardresearch\.com$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static domain pattern"))
    .collect()
});

pub fn is_suspicious_domain(hostname: &str) -> bool {
    SUSPICIOUS_DOMAIN_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(hostname))
}

pub fn contains_keyword_fragment(token: &str) -> bool {
    AD_KEYWORD_FRAGMENTS
        .iter()
        .any(|fragment| token.contains(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_match_inside_tokens() {
        assert!(contains_keyword_fragment("ad-banner-123"));
        assert!(contains_keyword_fragment("sponsored"));
        assert!(!contains_keyword_fragment("navigation"));
    }

    #[test]
    fn domain_patterns_anchor_where_it_matters() {
        assert!(is_suspicious_domain("static.doubleclick.net"));
        assert!(is_suspicious_domain("cdn.taboola.com"));
        assert!(!is_suspicious_domain("doubleclick.net.mirror.example.org"));
        assert!(!is_suspicious_domain("example.com"));
    }
}
