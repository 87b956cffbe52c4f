use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, info, warn};

use adshield_core_types::{MarkerIds, NodeId, Origin, Selector};
use adshield_event_bus::{InMemoryBus, Notice};
use adshield_host_dom::ports::query_or_empty;
use adshield_host_dom::HostTree;
use adshield_kv_store::KvStore;
use adshield_safety_gate::SafetyGate;

use crate::errors::EngineError;
use crate::model::{
    CandidateInfo, ExclusionDocument, RemovedRecord, SuppressionState, UndoAction,
    REMOVED_HISTORY_CAP, UNDO_STACK_CAP,
};

const KEY_RULES: &str = "rules";
const KEY_EXCLUSIONS: &str = "exclusions";
const KEY_SITE_SETTINGS: &str = "site_settings";
const KEY_PAUSED: &str = "paused";

#[derive(Debug, Default)]
struct EngineState {
    rules: Vec<Selector>,
    exclusions: BTreeMap<String, BTreeSet<String>>,
    /// Per-origin heuristic-scan opt-in.
    site_heuristics: BTreeMap<String, bool>,
    removed: VecDeque<RemovedRecord>,
    undo: Vec<UndoAction>,
    redo: Vec<UndoAction>,
    suppressed_count: u32,
    paused: bool,
}

pub struct RuleEngine {
    host: Arc<dyn HostTree>,
    gate: Arc<SafetyGate>,
    kv: Arc<dyn KvStore>,
    notices: Arc<InMemoryBus<Notice>>,
    markers: MarkerIds,
    state: RwLock<EngineState>,
    suppressed: DashMap<NodeId, SuppressionState>,
    candidates: DashMap<NodeId, CandidateInfo>,
}

impl RuleEngine {
    pub fn load(
        host: Arc<dyn HostTree>,
        gate: Arc<SafetyGate>,
        kv: Arc<dyn KvStore>,
        notices: Arc<InMemoryBus<Notice>>,
        markers: MarkerIds,
    ) -> Self {
        let mut state = EngineState::default();
        if let Some(value) = kv.get(KEY_RULES) {
            match serde_json::from_value::<Vec<String>>(value) {
                Ok(rules) => state.rules = rules.into_iter().map(Selector::new).collect(),
                Err(err) => warn!("corrupt rule list, starting empty: {}", err),
            }
        }
        if let Some(value) = kv.get(KEY_EXCLUSIONS) {
            match serde_json::from_value::<BTreeMap<String, BTreeSet<String>>>(value) {
                Ok(exclusions) => state.exclusions = exclusions,
                Err(err) => warn!("corrupt exclusions, starting empty: {}", err),
            }
        }
        if let Some(value) = kv.get(KEY_SITE_SETTINGS) {
            match serde_json::from_value::<BTreeMap<String, bool>>(value) {
                Ok(settings) => state.site_heuristics = settings,
                Err(err) => warn!("corrupt site settings, starting empty: {}", err),
            }
        }
        state.paused = kv
            .get(KEY_PAUSED)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Self {
            host,
            gate,
            kv,
            notices,
            markers,
            state: RwLock::new(state),
            suppressed: DashMap::new(),
            candidates: DashMap::new(),
        }
    }

    pub fn markers(&self) -> &MarkerIds {
        &self.markers
    }

    // ---- suppression ----------------------------------------------------

    /// Suppress a node. No-op (returning `false`) when the node is
    /// already suppressed, the selector is excluded for this origin, or
    /// the safety gate vetoes.
    pub async fn apply(
        &self,
        node: NodeId,
        selector: &Selector,
        is_heuristic: bool,
        reason: &str,
    ) -> bool {
        if selector.is_empty() || self.suppressed.contains_key(&node) {
            return false;
        }

        let origin = self.host.origin().await;
        if self.is_excluded(&origin, selector) {
            debug!(%selector, %origin, "selector excluded, skipping");
            return false;
        }

        let count = self.state.read().suppressed_count;
        let verdict = self.gate.is_safe_to_suppress(node, selector, count).await;
        if !verdict.allowed {
            return false;
        }

        if is_heuristic {
            self.hide(node, SuppressionState::Heuristic).await;
        } else {
            let record = RemovedRecord {
                selector: selector.clone(),
                parent: self.host.parent(node).await,
                anchor: self.host.next_sibling(node).await,
                reason: if reason.is_empty() {
                    "manual block".to_string()
                } else {
                    reason.to_string()
                },
                timestamp: chrono::Utc::now(),
            };
            {
                let mut state = self.state.write();
                state.removed.push_back(record);
                while state.removed.len() > REMOVED_HISTORY_CAP {
                    state.removed.pop_front();
                }
                // a rule matching several nodes is one logical action;
                // undo restores every node of the selector at once
                let already_on_top = state
                    .undo
                    .last()
                    .is_some_and(|action| action.selector == *selector);
                if !already_on_top {
                    state.undo.push(UndoAction::block(selector.clone()));
                    while state.undo.len() > UNDO_STACK_CAP {
                        state.undo.remove(0);
                    }
                    // a new action invalidates the redo branch
                    state.redo.clear();
                }
            }
            self.hide(node, SuppressionState::Manual).await;
        }

        self.state.write().suppressed_count += 1;
        debug!(%node, %selector, is_heuristic, "suppressed");
        true
    }

    /// Apply every confirmed rule tree-wide.
    pub async fn apply_rules(&self) {
        let rules = self.rules();
        for rule in rules {
            let matches = query_or_empty(self.host.as_ref(), &rule).await;
            for node in matches {
                self.apply(node, &rule, false, "rule").await;
            }
        }
    }

    /// Restore a node to visible, forgetting its suppression state.
    pub async fn restore(&self, node: NodeId) -> bool {
        if self.suppressed.remove(&node).is_none() {
            return false;
        }
        self.host.remove_class(node, &self.markers.hidden).await;
        self.host.remove_class(node, &self.markers.heuristic).await;
        let mut state = self.state.write();
        state.suppressed_count = state.suppressed_count.saturating_sub(1);
        true
    }

    async fn hide(&self, node: NodeId, mode: SuppressionState) {
        let paused = self.state.read().paused;
        if !paused {
            self.host.add_class(node, self.marker_for(mode)).await;
        }
        self.suppressed.insert(node, mode);
    }

    fn marker_for(&self, mode: SuppressionState) -> &str {
        match mode {
            SuppressionState::Manual => &self.markers.hidden,
            SuppressionState::Heuristic => &self.markers.heuristic,
        }
    }

    pub fn is_suppressed(&self, node: NodeId) -> bool {
        self.suppressed.contains_key(&node)
    }

    pub fn suppression_state(&self, node: NodeId) -> Option<SuppressionState> {
        self.suppressed.get(&node).map(|entry| *entry.value())
    }

    pub fn suppressed_count(&self) -> u32 {
        self.state.read().suppressed_count
    }

    pub fn removed_history(&self) -> Vec<RemovedRecord> {
        self.state.read().removed.iter().cloned().collect()
    }

    // ---- rules ----------------------------------------------------------

    pub fn rules(&self) -> Vec<Selector> {
        self.state.read().rules.clone()
    }

    pub fn has_rule(&self, selector: &Selector) -> bool {
        self.state.read().rules.iter().any(|r| r == selector)
    }

    pub fn add_rule(&self, selector: Selector) {
        if selector.is_empty() {
            return;
        }
        {
            let mut state = self.state.write();
            if state.rules.iter().any(|r| *r == selector) {
                return;
            }
            state.rules.push(selector);
        }
        self.persist_rules();
    }

    pub fn remove_rule(&self, selector: &Selector) {
        self.state.write().rules.retain(|r| r != selector);
        self.persist_rules();
    }

    // ---- undo / redo ----------------------------------------------------

    /// Undo the most recent manual block: restore every suppressed node
    /// the recorded selector still matches and drop the rule.
    pub async fn undo(&self) -> Option<Selector> {
        let action = self.state.write().undo.pop()?;
        let selector = action.selector.clone();

        for node in self.suppressed_nodes() {
            if self.host.matches(node, &selector).await {
                self.restore(node).await;
            }
        }
        self.remove_rule(&selector);
        self.state.write().redo.push(action);

        info!(%selector, "undid block");
        self.notices
            .emit(Notice::success(format!("restored {selector}")));
        Some(selector)
    }

    /// Re-apply the most recently undone block against the current tree.
    pub async fn redo(&self) -> Option<Selector> {
        let action = self.state.write().redo.pop()?;
        let selector = action.selector.clone();

        let matches = query_or_empty(self.host.as_ref(), &selector).await;
        for node in matches {
            if self.suppressed.contains_key(&node) {
                continue;
            }
            self.hide(node, SuppressionState::Manual).await;
            self.state.write().suppressed_count += 1;
        }
        self.add_rule(selector.clone());
        self.state.write().undo.push(action);

        info!(%selector, "redid block");
        self.notices
            .emit(Notice::success(format!("re-blocked {selector}")));
        Some(selector)
    }

    // ---- pause ----------------------------------------------------------

    /// Flip the global pause flag. Pausing renders every suppressed
    /// node visible again without losing its classification; resuming
    /// hides them back.
    pub async fn toggle_pause(&self) -> bool {
        let paused = {
            let mut state = self.state.write();
            state.paused = !state.paused;
            state.paused
        };
        for node in self.suppressed_nodes() {
            let Some(mode) = self.suppression_state(node) else {
                continue;
            };
            if paused {
                self.host.remove_class(node, self.marker_for(mode)).await;
            } else {
                self.host.add_class(node, self.marker_for(mode)).await;
            }
        }
        self.persist_value(KEY_PAUSED, json!(paused));
        self.notices.emit(Notice::info(if paused {
            "blocking paused"
        } else {
            "blocking resumed"
        }));
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    // ---- exclusions -----------------------------------------------------

    pub fn is_excluded(&self, origin: &Origin, selector: &Selector) -> bool {
        self.state
            .read()
            .exclusions
            .get(origin.as_str())
            .map(|set| set.contains(selector.as_str()))
            .unwrap_or(false)
    }

    /// Exclude a selector for an origin and restore anything it
    /// currently suppresses.
    pub async fn add_exclusion(&self, origin: &Origin, selector: Selector) {
        if selector.is_empty() {
            return;
        }
        {
            let mut state = self.state.write();
            state
                .exclusions
                .entry(origin.as_str().to_string())
                .or_default()
                .insert(selector.as_str().to_string());
        }
        self.persist_exclusions();

        for node in self.suppressed_nodes() {
            if self.host.matches(node, &selector).await {
                self.restore(node).await;
            }
        }
    }

    pub fn export_exclusions(&self, origin: &Origin) -> ExclusionDocument {
        let exclusions = self
            .state
            .read()
            .exclusions
            .get(origin.as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ExclusionDocument {
            hostname: origin.as_str().to_string(),
            exclusions,
        }
    }

    /// Merge an exclusion document. Both fields must be present and
    /// well-typed or nothing is merged.
    pub fn import_exclusions(&self, raw: &str) -> Result<usize, EngineError> {
        let document = Self::parse_exclusion_document(raw);
        let document = match document {
            Ok(document) => document,
            Err(err) => {
                self.notices
                    .emit(Notice::error(format!("exclusion import failed: {err}")));
                return Err(err);
            }
        };

        let added = {
            let mut state = self.state.write();
            let set = state.exclusions.entry(document.hostname.clone()).or_default();
            let before = set.len();
            set.extend(document.exclusions.iter().cloned());
            set.len() - before
        };
        self.persist_exclusions();
        self.notices.emit(Notice::success(format!(
            "imported {added} exclusions for {}",
            document.hostname
        )));
        Ok(added)
    }

    fn parse_exclusion_document(raw: &str) -> Result<ExclusionDocument, EngineError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|err| EngineError::InvalidFormat(err.to_string()))?;
        let hostname = value
            .get("hostname")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::InvalidFormat("missing hostname".into()))?;
        let list = value
            .get("exclusions")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EngineError::InvalidFormat("exclusions must be an array".into()))?;
        let mut exclusions = Vec::with_capacity(list.len());
        for item in list {
            let selector = item.as_str().ok_or_else(|| {
                EngineError::InvalidFormat("exclusions must be strings".into())
            })?;
            exclusions.push(selector.to_string());
        }
        Ok(ExclusionDocument {
            hostname: hostname.to_string(),
            exclusions,
        })
    }

    // ---- heuristic candidates & site settings ---------------------------

    pub fn remember_candidate(&self, node: NodeId, info: CandidateInfo) {
        self.candidates.insert(node, info);
    }

    pub fn candidate(&self, node: NodeId) -> Option<CandidateInfo> {
        self.candidates.get(&node).map(|entry| entry.value().clone())
    }

    pub fn take_candidate(&self, node: NodeId) -> Option<CandidateInfo> {
        self.candidates.remove(&node).map(|(_, info)| info)
    }

    pub fn has_candidate(&self, node: NodeId) -> bool {
        self.candidates.contains_key(&node)
    }

    pub fn pending_candidates(&self) -> Vec<(NodeId, CandidateInfo)> {
        self.candidates
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn heuristics_enabled(&self, origin: &Origin) -> bool {
        self.state
            .read()
            .site_heuristics
            .get(origin.as_str())
            .copied()
            .unwrap_or(false)
    }

    pub fn set_heuristics_enabled(&self, origin: &Origin, enabled: bool) {
        self.state
            .write()
            .site_heuristics
            .insert(origin.as_str().to_string(), enabled);
        self.persist_site_settings();
    }

    /// Discard all transient per-page state. Persisted rules,
    /// exclusions and site settings survive.
    pub fn page_reset(&self) {
        self.suppressed.clear();
        self.candidates.clear();
        let mut state = self.state.write();
        state.removed.clear();
        state.undo.clear();
        state.redo.clear();
        state.suppressed_count = 0;
    }

    // ---- persistence ----------------------------------------------------

    fn suppressed_nodes(&self) -> Vec<NodeId> {
        self.suppressed.iter().map(|entry| *entry.key()).collect()
    }

    fn persist_rules(&self) {
        let rules: Vec<String> = self
            .state
            .read()
            .rules
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        self.persist_value(KEY_RULES, json!(rules));
    }

    fn persist_exclusions(&self) {
        let value = serde_json::to_value(&self.state.read().exclusions)
            .unwrap_or_else(|_| json!({}));
        self.persist_value(KEY_EXCLUSIONS, value);
    }

    fn persist_site_settings(&self) {
        let value = serde_json::to_value(&self.state.read().site_heuristics)
            .unwrap_or_else(|_| json!({}));
        self.persist_value(KEY_SITE_SETTINGS, value);
    }

    fn persist_value(&self, key: &str, value: serde_json::Value) {
        if let Err(err) = self.kv.put(key, value) {
            // the persistence collaborator owns durability; no retry
            warn!(key, "persist failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use adshield_core_types::Viewport;
    use adshield_host_dom::{MemoryDom, NodeSpec};
    use adshield_kv_store::MemoryKv;
    use adshield_safety_gate::{AutoConfirmer, SafetyLimits};

    struct Fixture {
        dom: Arc<MemoryDom>,
        kv: Arc<MemoryKv>,
        engine: RuleEngine,
    }

    fn page() -> NodeSpec {
        NodeSpec::new("body")
            .with_child(NodeSpec::new("main").with_id("content"))
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["ad-box"])
                    .with_bbox(0.0, 0.0, 300.0, 250.0),
            )
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["ad-box"])
                    .with_bbox(0.0, 300.0, 300.0, 250.0),
            )
            .with_child(NodeSpec::new("aside").with_classes(&["promo"]))
    }

    fn fixture() -> Fixture {
        fixture_with_kv(Arc::new(MemoryKv::new()))
    }

    fn fixture_with_kv(kv: Arc<MemoryKv>) -> Fixture {
        let dom = Arc::new(MemoryDom::new(
            Origin::new("example.com"),
            Viewport::new(1280.0, 800.0),
        ));
        dom.insert(None, &page());
        let notices = InMemoryBus::new(32);
        let gate = Arc::new(SafetyGate::new(
            dom.clone(),
            Arc::new(AutoConfirmer(true)),
            notices.clone(),
            SafetyLimits::default(),
        ));
        let engine = RuleEngine::load(dom.clone(), gate, kv.clone(), notices, MarkerIds::mint());
        Fixture { dom, kv, engine }
    }

    async fn node(dom: &MemoryDom, selector: &str) -> NodeId {
        dom.query(&Selector::new(selector)).await.unwrap()[0]
    }

    #[tokio::test]
    async fn manual_apply_hides_and_records() {
        let fx = fixture();
        let target = node(&fx.dom, ".ad-box").await;
        assert!(fx.engine.apply(target, &Selector::new(".ad-box"), false, "").await);

        assert_eq!(fx.engine.suppressed_count(), 1);
        assert_eq!(
            fx.engine.suppression_state(target),
            Some(SuppressionState::Manual)
        );
        let classes = fx.dom.class_list(target).await;
        assert!(classes.contains(&fx.engine.markers().hidden));
        let history = fx.engine.removed_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reason, "manual block");
    }

    #[tokio::test]
    async fn apply_is_idempotent_per_node() {
        let fx = fixture();
        let target = node(&fx.dom, ".ad-box").await;
        let selector = Selector::new(".ad-box");
        assert!(fx.engine.apply(target, &selector, false, "").await);
        assert!(!fx.engine.apply(target, &selector, false, "").await);
        assert_eq!(fx.engine.suppressed_count(), 1);
    }

    #[tokio::test]
    async fn excluded_selector_never_leaves_visible() {
        let fx = fixture();
        let origin = fx.dom.origin().await;
        fx.engine
            .add_exclusion(&origin, Selector::new(".ad-box"))
            .await;

        let target = node(&fx.dom, ".ad-box").await;
        assert!(!fx.engine.apply(target, &Selector::new(".ad-box"), false, "").await);
        assert!(!fx.engine.is_suppressed(target));
        assert_eq!(fx.engine.suppressed_count(), 0);
    }

    #[tokio::test]
    async fn gate_veto_leaves_node_visible_without_counting() {
        let fx = fixture();
        let target = node(&fx.dom, "#content").await;
        assert!(!fx.engine.apply(target, &Selector::new("#content"), false, "").await);
        assert!(!fx.engine.is_suppressed(target));
        assert_eq!(fx.engine.suppressed_count(), 0);
    }

    #[tokio::test]
    async fn heuristic_apply_skips_undo_history() {
        let fx = fixture();
        let target = node(&fx.dom, ".promo").await;
        assert!(
            fx.engine
                .apply(target, &Selector::new(".promo"), true, "looks like an ad")
                .await
        );
        assert_eq!(
            fx.engine.suppression_state(target),
            Some(SuppressionState::Heuristic)
        );
        assert!(fx.engine.removed_history().is_empty());
        assert!(fx.engine.undo().await.is_none());
        assert_eq!(fx.engine.suppressed_count(), 1);
    }

    #[tokio::test]
    async fn undo_then_redo_roundtrips() {
        let fx = fixture();
        let selector = Selector::new(".ad-box");
        let boxes = fx.dom.query(&selector).await.unwrap();
        for target in &boxes {
            fx.engine.apply(*target, &selector, false, "").await;
        }
        fx.engine.add_rule(selector.clone());
        assert_eq!(fx.engine.suppressed_count(), 2);

        // undo restores every node the selector matches and drops the rule
        assert_eq!(fx.engine.undo().await, Some(selector.clone()));
        assert_eq!(fx.engine.suppressed_count(), 0);
        assert!(!fx.engine.has_rule(&selector));
        for target in &boxes {
            assert!(!fx.dom.class_list(*target).await.contains(&fx.engine.markers().hidden));
        }

        // redo re-resolves and re-applies
        assert_eq!(fx.engine.redo().await, Some(selector.clone()));
        assert_eq!(fx.engine.suppressed_count(), 2);
        assert!(fx.engine.has_rule(&selector));
    }

    #[tokio::test]
    async fn new_action_clears_the_redo_stack() {
        let fx = fixture();
        let selector = Selector::new(".ad-box");
        let boxes = fx.dom.query(&selector).await.unwrap();
        fx.engine.apply(boxes[0], &selector, false, "").await;
        fx.engine.undo().await;

        fx.engine
            .apply(node(&fx.dom, ".promo").await, &Selector::new(".promo"), false, "")
            .await;
        assert!(fx.engine.redo().await.is_none());
    }

    #[tokio::test]
    async fn rule_matching_many_nodes_is_one_undo_step() {
        let fx = fixture();
        let selector = Selector::new(".ad-box");
        fx.engine.add_rule(selector.clone());
        fx.engine.apply_rules().await;
        assert_eq!(fx.engine.suppressed_count(), 2);

        // one undo reverses the whole pass; a second finds nothing left
        assert_eq!(fx.engine.undo().await, Some(selector.clone()));
        assert_eq!(fx.engine.suppressed_count(), 0);
        assert!(fx.engine.undo().await.is_none());
    }

    #[tokio::test]
    async fn removed_history_keeps_only_the_latest_ten() {
        let fx = fixture();
        let root = fx.dom.query(&Selector::new("body")).await.unwrap()[0];
        for i in 0..11 {
            let class = format!("spot-{i}");
            let spec = NodeSpec::new("div").with_classes(&[class.as_str()]);
            let inserted = fx.dom.insert(Some(root), &spec);
            fx.engine
                .apply(inserted, &Selector::new(format!(".spot-{i}")), false, "")
                .await;
        }
        let history = fx.engine.removed_history();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].selector.as_str(), ".spot-1");
        assert_eq!(history[9].selector.as_str(), ".spot-10");
    }

    #[tokio::test]
    async fn pause_unhides_without_forgetting() {
        let fx = fixture();
        let target = node(&fx.dom, ".ad-box").await;
        fx.engine.apply(target, &Selector::new(".ad-box"), false, "").await;

        assert!(fx.engine.toggle_pause().await);
        assert!(!fx.dom.class_list(target).await.contains(&fx.engine.markers().hidden));
        assert!(fx.engine.is_suppressed(target));

        assert!(!fx.engine.toggle_pause().await);
        assert!(fx.dom.class_list(target).await.contains(&fx.engine.markers().hidden));
    }

    #[tokio::test]
    async fn rules_and_exclusions_survive_reload() {
        let kv = Arc::new(MemoryKv::new());
        {
            let fx = fixture_with_kv(kv.clone());
            fx.engine.add_rule(Selector::new(".ad-box"));
            let origin = fx.dom.origin().await;
            fx.engine
                .add_exclusion(&origin, Selector::new(".keep-me"))
                .await;
            fx.engine.set_heuristics_enabled(&origin, true);
        }
        let fx = fixture_with_kv(kv);
        assert!(fx.engine.has_rule(&Selector::new(".ad-box")));
        let origin = fx.dom.origin().await;
        assert!(fx.engine.is_excluded(&origin, &Selector::new(".keep-me")));
        assert!(fx.engine.heuristics_enabled(&origin));
    }

    #[tokio::test]
    async fn import_validates_before_merging() {
        let fx = fixture();
        let origin = fx.dom.origin().await;

        assert!(fx.engine.import_exclusions("{").is_err());
        assert!(fx
            .engine
            .import_exclusions(r#"{"exclusions": [".a"]}"#)
            .is_err());
        assert!(fx
            .engine
            .import_exclusions(r#"{"hostname": "example.com", "exclusions": ".a"}"#)
            .is_err());
        assert!(fx
            .engine
            .import_exclusions(r#"{"hostname": "example.com", "exclusions": [1]}"#)
            .is_err());
        // nothing was merged by the failed attempts
        assert!(fx.engine.export_exclusions(&origin).exclusions.is_empty());

        let added = fx
            .engine
            .import_exclusions(r#"{"hostname": "example.com", "exclusions": [".a", ".b"]}"#)
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(fx.engine.export_exclusions(&origin).exclusions.len(), 2);
    }

    #[tokio::test]
    async fn page_reset_clears_transients_only() {
        let fx = fixture();
        let target = node(&fx.dom, ".ad-box").await;
        fx.engine.apply(target, &Selector::new(".ad-box"), false, "").await;
        fx.engine.add_rule(Selector::new(".ad-box"));
        fx.engine.remember_candidate(
            target,
            CandidateInfo {
                selector: Selector::new(".ad-box"),
                confidence: 0.8,
                reason: "test".into(),
            },
        );

        fx.engine.page_reset();
        assert_eq!(fx.engine.suppressed_count(), 0);
        assert!(fx.engine.pending_candidates().is_empty());
        assert!(fx.engine.removed_history().is_empty());
        // rules persist across navigation
        assert!(fx.engine.has_rule(&Selector::new(".ad-box")));
    }
}
