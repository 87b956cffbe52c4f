//! Ordered safety checks with notice publication on rejection.

use std::sync::Arc;

use tracing::{debug, warn};

use adshield_core_types::{NodeId, Selector};
use adshield_event_bus::{InMemoryBus, Notice};
use adshield_host_dom::HostTree;

use crate::ports::Confirmer;
use crate::types::{GateVerdict, SafetyLimits};

pub struct SafetyGate {
    host: Arc<dyn HostTree>,
    confirmer: Arc<dyn Confirmer>,
    notices: Arc<InMemoryBus<Notice>>,
    limits: SafetyLimits,
}

impl SafetyGate {
    pub fn new(
        host: Arc<dyn HostTree>,
        confirmer: Arc<dyn Confirmer>,
        notices: Arc<InMemoryBus<Notice>>,
        limits: SafetyLimits,
    ) -> Self {
        Self {
            host,
            confirmer,
            notices,
            limits,
        }
    }

    /// Decide whether suppressing the node is safe. Checks run in
    /// order and short-circuit; hard rejections surface a warning
    /// notice, declined confirmations reject silently (the user just
    /// said no).
    pub async fn is_safe_to_suppress(
        &self,
        node: NodeId,
        selector: &Selector,
        suppressed_count: u32,
    ) -> GateVerdict {
        if suppressed_count >= self.limits.max_blocks_per_page {
            return self.rejected(selector, "page block limit reached");
        }

        for critical in &self.limits.critical_selectors {
            if self.host.matches(node, &Selector::new(critical.clone())).await {
                return self.rejected(
                    selector,
                    format!("element matches critical selector {critical}"),
                );
            }
        }

        if let Some(bbox) = self.host.bounding_box(node).await {
            let viewport = self.host.viewport().await;
            if viewport.area() > 0.0 && bbox.area() > viewport.area() * self.limits.min_content_ratio
            {
                let confirmed = self
                    .confirmer
                    .confirm(
                        "This element covers a large share of the page. Suppress it anyway?",
                    )
                    .await;
                if !confirmed {
                    debug!(%selector, "large-area suppression declined");
                    return GateVerdict::reject("large-area suppression declined");
                }
            }
        }

        let classes = self.host.class_list(node).await;
        let has_unsafe_class = self.limits.unsafe_classes.iter().any(|unsafe_class| {
            classes
                .iter()
                .any(|c| c.to_lowercase().contains(&unsafe_class.to_lowercase()))
        });
        if has_unsafe_class {
            let confirmed = self
                .confirmer
                .confirm("This element may hold important content. Suppress it anyway?")
                .await;
            if !confirmed {
                debug!(%selector, "unsafe-class suppression declined");
                return GateVerdict::reject("unsafe-class suppression declined");
            }
        }

        for child in self.host.children(node).await {
            for critical in &self.limits.critical_selectors {
                if self.host.matches(child, &Selector::new(critical.clone())).await {
                    return self.rejected(
                        selector,
                        format!("element wraps critical content ({critical})"),
                    );
                }
            }
        }

        GateVerdict::pass()
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    fn rejected(&self, selector: &Selector, reason: impl Into<String>) -> GateVerdict {
        let reason = reason.into();
        warn!(%selector, "suppression vetoed: {}", reason);
        self.notices.emit(Notice::warning(format!(
            "suppression of {selector} cancelled: {reason}"
        )));
        GateVerdict::reject(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use adshield_core_types::{Origin, Viewport};
    use adshield_event_bus::NoticeLevel;
    use adshield_host_dom::{MemoryDom, NodeSpec};

    use crate::ports::AutoConfirmer;

    fn page() -> Arc<MemoryDom> {
        let root = NodeSpec::new("body")
            .with_child(
                NodeSpec::new("main").with_id("content").with_child(
                    NodeSpec::new("article").with_classes(&["post"]),
                ),
            )
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["promo-box"])
                    .with_bbox(900.0, 0.0, 300.0, 250.0),
            )
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["page-wrapper"])
                    .with_bbox(0.0, 0.0, 1280.0, 700.0),
            )
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["outer"])
                    .with_child(NodeSpec::new("nav")),
            )
            .with_child(
                NodeSpec::new("div")
                    .with_classes(&["sidebar-Wrapper"])
                    .with_bbox(0.0, 0.0, 200.0, 200.0),
            );
        let dom = MemoryDom::new(Origin::new("example.com"), Viewport::new(1280.0, 800.0));
        dom.insert(None, &root);
        Arc::new(dom)
    }

    fn gate(dom: Arc<MemoryDom>, confirm: bool) -> (SafetyGate, Arc<InMemoryBus<Notice>>) {
        let notices = InMemoryBus::new(16);
        let gate = SafetyGate::new(
            dom,
            Arc::new(AutoConfirmer(confirm)),
            notices.clone(),
            SafetyLimits::default(),
        );
        (gate, notices)
    }

    async fn node(dom: &MemoryDom, selector: &str) -> NodeId {
        dom.query(&Selector::new(selector)).await.unwrap()[0]
    }

    #[tokio::test]
    async fn ordinary_promo_box_passes() {
        let dom = page();
        let (gate, _) = gate(dom.clone(), false);
        let target = node(&dom, ".promo-box").await;
        let verdict = gate
            .is_safe_to_suppress(target, &Selector::new(".promo-box"), 0)
            .await;
        assert!(verdict.allowed);
    }

    #[tokio::test]
    async fn block_budget_rejects_with_notice() {
        let dom = page();
        let (gate, bus) = gate(dom.clone(), false);
        let mut rx = bus.subscribe();
        let target = node(&dom, ".promo-box").await;
        let verdict = gate
            .is_safe_to_suppress(target, &Selector::new(".promo-box"), 50)
            .await;
        assert!(!verdict.allowed);
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("block limit"));
    }

    #[tokio::test]
    async fn critical_landmark_is_vetoed() {
        let dom = page();
        let (gate, _) = gate(dom.clone(), true);
        let target = node(&dom, "#content").await;
        let verdict = gate
            .is_safe_to_suppress(target, &Selector::new("#content"), 0)
            .await;
        assert!(!verdict.allowed);
        assert!(verdict.reason.unwrap().contains("critical selector"));
    }

    #[tokio::test]
    async fn large_area_requires_confirmation() {
        let dom = page();
        let target = node(&dom, ".page-wrapper").await;

        let (declining, _) = gate(dom.clone(), false);
        let verdict = declining
            .is_safe_to_suppress(target, &Selector::new(".page-wrapper"), 0)
            .await;
        assert!(!verdict.allowed);

        let (accepting, _) = gate(dom.clone(), true);
        let verdict = accepting
            .is_safe_to_suppress(target, &Selector::new(".page-wrapper"), 0)
            .await;
        assert!(verdict.allowed);
    }

    #[tokio::test]
    async fn unsafe_class_substring_matches_case_insensitively() {
        let dom = page();
        // small element, so only the "Wrapper" substring triggers the prompt
        let target = node(&dom, ".sidebar-Wrapper").await;

        let (declining, _) = gate(dom.clone(), false);
        let verdict = declining
            .is_safe_to_suppress(target, &Selector::new(".sidebar-Wrapper"), 0)
            .await;
        assert_eq!(
            verdict.reason.as_deref(),
            Some("unsafe-class suppression declined")
        );

        let (accepting, _) = gate(dom.clone(), true);
        let verdict = accepting
            .is_safe_to_suppress(target, &Selector::new(".sidebar-Wrapper"), 0)
            .await;
        assert!(verdict.allowed);
    }

    #[tokio::test]
    async fn container_wrapping_critical_content_is_vetoed() {
        let dom = page();
        let target = node(&dom, ".outer").await;
        let (gate, _) = gate(dom.clone(), true);
        let verdict = gate
            .is_safe_to_suppress(target, &Selector::new(".outer"), 0)
            .await;
        assert!(!verdict.allowed);
        assert!(verdict.reason.unwrap().contains("wraps critical content"));
    }
}
