//! The additive scorer.

use std::sync::Arc;

use tracing::{debug, warn};

use adshield_core_types::NodeId;
use adshield_host_dom::HostTree;
use adshield_pattern_store::{LearnedPatterns, PatternStore};
use adshield_selector_synth::SelectorSynthesizer;

use crate::extract;
use crate::model::{weights, Confidence, TYPICAL_AD_AREA};
use crate::ports::ExternalScorer;
use crate::statics;

pub struct ConfidenceClassifier {
    host: Arc<dyn HostTree>,
    patterns: Arc<PatternStore>,
    synth: Arc<SelectorSynthesizer>,
    external: Option<Arc<dyn ExternalScorer>>,
}

impl ConfidenceClassifier {
    pub fn new(
        host: Arc<dyn HostTree>,
        patterns: Arc<PatternStore>,
        synth: Arc<SelectorSynthesizer>,
    ) -> Self {
        Self {
            host,
            patterns,
            synth,
            external: None,
        }
    }

    pub fn with_external_scorer(mut self, scorer: Arc<dyn ExternalScorer>) -> Self {
        self.external = Some(scorer);
        self
    }

    /// Score one node. Each signal contributes independently; a signal
    /// that cannot be extracted contributes zero.
    pub async fn score(&self, node: NodeId) -> Confidence {
        let patterns = self.patterns.snapshot();
        let mut value = 0.0;
        let mut reasons = Vec::new();

        self.keyword_signal(node, &patterns, &mut value, &mut reasons)
            .await;
        self.selector_signal(node, &patterns, &mut value, &mut reasons)
            .await;
        self.geometry_signal(node, &patterns, &mut value, &mut reasons)
            .await;
        self.position_signal(node, &patterns, &mut value, &mut reasons)
            .await;
        self.domain_signal(node, &patterns, &mut value, &mut reasons)
            .await;
        self.behavior_signal(node, &mut value, &mut reasons).await;

        let mut value = value.min(1.0);

        if let Some(scorer) = &self.external {
            let features = extract::feature_vector(self.host.as_ref(), node).await;
            match scorer.predict(features).await {
                Ok(prediction) => {
                    // deliberate override, not a blend
                    value = prediction.clamp(0.0, 1.0);
                    reasons.push(format!("external scorer prediction: {:.2}", value));
                }
                Err(err) => {
                    warn!("external scorer unavailable, keeping heuristic score: {}", err);
                }
            }
        }

        let is_likely = value >= patterns.confidence_threshold;
        debug!(%node, value, is_likely, "scored");
        Confidence {
            value,
            reasons,
            is_likely,
        }
    }

    async fn keyword_signal(
        &self,
        node: NodeId,
        patterns: &LearnedPatterns,
        value: &mut f64,
        reasons: &mut Vec<String>,
    ) {
        let tokens = extract::identity_tokens(self.host.as_ref(), node).await;
        let matched: Vec<&str> = tokens
            .iter()
            .filter(|t| patterns.keywords.contains(*t) || statics::contains_keyword_fragment(t))
            .map(|t| t.as_str())
            .collect();
        if !matched.is_empty() {
            *value += weights::PER_KEYWORD * matched.len() as f64;
            reasons.push(format!("keyword match: {}", matched.join(", ")));
        }
    }

    async fn selector_signal(
        &self,
        node: NodeId,
        patterns: &LearnedPatterns,
        value: &mut f64,
        reasons: &mut Vec<String>,
    ) {
        let selector = self.synth.synthesize(node).await;
        if !selector.is_empty() && patterns.selectors.contains(selector.as_str()) {
            *value += weights::SELECTOR_MEMORY;
            reasons.push("selector pattern match".to_string());
        }
    }

    async fn geometry_signal(
        &self,
        node: NodeId,
        patterns: &LearnedPatterns,
        value: &mut f64,
        reasons: &mut Vec<String>,
    ) {
        let Some(size) = extract::size_sample(self.host.as_ref(), node).await else {
            return;
        };
        if !patterns.sizes.is_empty() {
            if patterns.sizes.iter().any(|stored| stored.near(&size)) {
                *value += weights::SIZE_MATCH;
                reasons.push("size pattern match".to_string());
            }
        } else if TYPICAL_AD_AREA.contains(&(size.width * size.height)) {
            *value += weights::TYPICAL_AD_SIZE;
            reasons.push("typical ad size".to_string());
        }
    }

    async fn position_signal(
        &self,
        node: NodeId,
        patterns: &LearnedPatterns,
        value: &mut f64,
        reasons: &mut Vec<String>,
    ) {
        let viewport = self.host.viewport().await;
        let Some(position) = extract::position_sample(self.host.as_ref(), node, viewport).await
        else {
            return;
        };
        if !patterns.positions.is_empty() {
            if patterns
                .positions
                .iter()
                .any(|stored| stored.near(&position))
            {
                *value += weights::POSITION_MATCH;
                reasons.push("position pattern match".to_string());
            }
        } else {
            if position.top < 0.3 {
                *value += weights::EDGE_PLACEMENT;
                reasons.push("top-of-viewport placement".to_string());
            }
            if position.right > 0.7 {
                *value += weights::EDGE_PLACEMENT;
                reasons.push("right-edge placement".to_string());
            }
        }
    }

    async fn domain_signal(
        &self,
        node: NodeId,
        patterns: &LearnedPatterns,
        value: &mut f64,
        reasons: &mut Vec<String>,
    ) {
        let Some(hostname) = extract::resource_host(self.host.as_ref(), node).await else {
            return;
        };
        if patterns.domains.contains(&hostname) {
            *value += weights::LEARNED_DOMAIN;
            reasons.push(format!("known ad domain: {hostname}"));
        } else if statics::is_suspicious_domain(&hostname) {
            *value += weights::SUSPICIOUS_DOMAIN;
            reasons.push(format!("suspicious domain: {hostname}"));
        }
    }

    async fn behavior_signal(&self, node: NodeId, value: &mut f64, reasons: &mut Vec<String>) {
        if self.host.has_interaction_handler(node).await {
            *value += weights::INTERACTION_HANDLER;
            reasons.push("interaction handler attached".to_string());
        }
        if self.host.has_animation(node).await {
            *value += weights::ANIMATED_STYLE;
            reasons.push("animated styling".to_string());
        }
    }
}
