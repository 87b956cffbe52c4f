//! Engine composition: every component crate wired behind one facade.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use adshield_classifier::{ConfidenceClassifier, ExternalScorer};
use adshield_classifier::extract::collect_learn_sample;
use adshield_core_types::{MarkerIds, NodeId, Origin, Selector};
use adshield_event_bus::{InMemoryBus, Notice};
use adshield_host_dom::HostTree;
use adshield_kv_store::KvStore;
use adshield_pattern_store::{LearnedPatterns, PatternStore};
use adshield_rule_engine::{CandidateInfo, EngineError, ExclusionDocument, RuleEngine};
use adshield_safety_gate::{Confirmer, SafetyGate, SafetyLimits};
use adshield_scan_scheduler::{ScanConfig, ScanScheduler, ScanSink};
use adshield_selector_synth::SelectorSynthesizer;

/// The assembled engine. One instance per page session.
pub struct ShieldEngine {
    host: Arc<dyn HostTree>,
    synth: Arc<SelectorSynthesizer>,
    patterns: Arc<PatternStore>,
    classifier: ConfidenceClassifier,
    rules: Arc<RuleEngine>,
    notices: Arc<InMemoryBus<Notice>>,
}

impl ShieldEngine {
    pub fn new(
        host: Arc<dyn HostTree>,
        kv: Arc<dyn KvStore>,
        confirmer: Arc<dyn Confirmer>,
        limits: SafetyLimits,
        external: Option<Arc<dyn ExternalScorer>>,
    ) -> Arc<Self> {
        let notices = InMemoryBus::new(64);
        let markers = MarkerIds::mint();
        let patterns = Arc::new(PatternStore::load(kv.clone()));
        let synth = Arc::new(SelectorSynthesizer::new(host.clone(), markers.clone()));
        let mut classifier =
            ConfidenceClassifier::new(host.clone(), patterns.clone(), synth.clone());
        if let Some(scorer) = external {
            classifier = classifier.with_external_scorer(scorer);
        }
        let gate = Arc::new(SafetyGate::new(
            host.clone(),
            confirmer,
            notices.clone(),
            limits,
        ));
        let rules = Arc::new(RuleEngine::load(
            host.clone(),
            gate,
            kv,
            notices.clone(),
            markers,
        ));
        Arc::new(Self {
            host,
            synth,
            patterns,
            classifier,
            rules,
            notices,
        })
    }

    pub fn notices(&self) -> &Arc<InMemoryBus<Notice>> {
        &self.notices
    }

    pub fn rules(&self) -> &Arc<RuleEngine> {
        &self.rules
    }

    pub fn learned(&self) -> LearnedPatterns {
        self.patterns.snapshot()
    }

    pub async fn origin(&self) -> Origin {
        self.host.origin().await
    }

    /// Manually block an element: derive its selector, suppress it,
    /// promote the selector to a rule and learn from it.
    pub async fn block_element(&self, node: NodeId) -> Option<Selector> {
        let selector = self.synth.synthesize(node).await;
        if selector.is_empty() {
            self.notices
                .emit(Notice::warning("no stable selector for that element"));
            return None;
        }
        // sample before suppression so the marker class is not learned
        let sample = collect_learn_sample(self.host.as_ref(), node, selector.clone()).await;
        if !self.rules.apply(node, &selector, false, "manual block").await {
            return None;
        }
        self.rules.add_rule(selector.clone());
        self.patterns.learn(&sample, true);
        self.notices
            .emit(Notice::success(format!("blocked {selector}")));
        Some(selector)
    }

    /// Accept a pending heuristic match: promote it to a manual rule
    /// and feed the learning loop a correct-guess event.
    pub async fn confirm_candidate(&self, node: NodeId) -> bool {
        let Some(info) = self.rules.take_candidate(node) else {
            return false;
        };
        self.rules.restore(node).await;
        let sample =
            collect_learn_sample(self.host.as_ref(), node, info.selector.clone()).await;
        if self
            .rules
            .apply(node, &info.selector, false, &info.reason)
            .await
        {
            self.rules.add_rule(info.selector.clone());
        }
        self.patterns.learn(&sample, true);
        self.patterns.process_feedback(true);
        info!(selector = %info.selector, "candidate confirmed");
        true
    }

    /// Reject a pending heuristic match: restore the node and feed the
    /// learning loop a wrong-guess event.
    pub async fn reject_candidate(&self, node: NodeId) -> bool {
        let Some(info) = self.rules.take_candidate(node) else {
            return false;
        };
        self.rules.restore(node).await;
        let sample =
            collect_learn_sample(self.host.as_ref(), node, info.selector.clone()).await;
        self.patterns.learn(&sample, false);
        self.patterns.process_feedback(false);
        self.notices
            .emit(Notice::info(format!("kept {}", info.selector)));
        true
    }

    pub async fn undo(&self) -> Option<Selector> {
        self.rules.undo().await
    }

    pub async fn redo(&self) -> Option<Selector> {
        self.rules.redo().await
    }

    pub async fn toggle_pause(&self) -> bool {
        self.rules.toggle_pause().await
    }

    pub async fn add_exclusion(&self, selector: Selector) {
        let origin = self.host.origin().await;
        self.rules.add_exclusion(&origin, selector).await;
    }

    pub async fn export_exclusions(&self) -> ExclusionDocument {
        let origin = self.host.origin().await;
        self.rules.export_exclusions(&origin)
    }

    pub fn import_exclusions(&self, raw: &str) -> Result<usize, EngineError> {
        self.rules.import_exclusions(raw)
    }

    pub async fn set_heuristics_enabled(&self, enabled: bool) {
        let origin = self.host.origin().await;
        self.rules.set_heuristics_enabled(&origin, enabled);
    }

    pub fn page_reset(&self) {
        self.rules.page_reset();
    }

    /// Spawn the background scan loop; the returned scheduler owns it.
    pub fn start_scanning(self: &Arc<Self>, config: ScanConfig) -> ScanScheduler {
        let sink: Arc<dyn ScanSink> = self.clone();
        let mut scheduler = ScanScheduler::new(self.host.clone(), sink, config);
        scheduler.start();
        scheduler
    }

    /// One-shot sweep of the current tree, as on page load.
    pub async fn scan_once(self: &Arc<Self>, config: ScanConfig) {
        let sink: Arc<dyn ScanSink> = self.clone();
        ScanScheduler::new(self.host.clone(), sink, config)
            .scan_now()
            .await;
    }

    async fn classify(&self, node: NodeId) {
        if self.rules.is_suppressed(node) || self.rules.has_candidate(node) {
            return;
        }
        let verdict = self.classifier.score(node).await;
        if !verdict.is_likely {
            debug!(%node, value = verdict.value, "below threshold");
            return;
        }
        let selector = self.synth.synthesize(node).await;
        if selector.is_empty() {
            return;
        }
        if self
            .rules
            .apply(node, &selector, true, "heuristic match")
            .await
        {
            self.notices.emit(Notice::info(format!(
                "hid likely ad {selector} ({:.2})",
                verdict.value
            )));
            self.rules.remember_candidate(
                node,
                CandidateInfo {
                    selector,
                    confidence: verdict.value,
                    reason: verdict.reasons.join(", "),
                },
            );
        }
    }
}

#[async_trait]
impl ScanSink for ShieldEngine {
    async fn paused(&self) -> bool {
        self.rules.is_paused()
    }

    async fn heuristics_enabled(&self) -> bool {
        let origin = self.host.origin().await;
        self.rules.heuristics_enabled(&origin)
    }

    async fn apply_rules(&self) {
        self.rules.apply_rules().await;
    }

    async fn process_candidates(&self, nodes: Vec<NodeId>) {
        for node in nodes {
            self.classify(node).await;
        }
    }

    async fn process_resources(&self, nodes: Vec<NodeId>) {
        for node in nodes {
            self.classify(node).await;
        }
    }
}
