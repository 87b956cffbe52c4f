//! Fixed, enumerated feature extractors.
//!
//! Every extractor returns an `Option`; absence of an attribute or a
//! malformed value is not an error, it simply contributes nothing.

use url::Url;

use adshield_core_types::{NodeId, Selector, Viewport};
use adshield_host_dom::HostTree;
use adshield_pattern_store::{LearnSample, PositionSample, SizeSample};

use crate::ports::FEATURE_COUNT;

/// Attributes whose values identify a node for keyword matching.
pub const IDENTITY_ATTRIBUTES: [&str; 7] = [
    "class",
    "id",
    "role",
    "aria-label",
    "data-ad-slot",
    "data-ad-client",
    "data-ad-layout",
];

/// Tags that load external resources.
const RESOURCE_TAGS: [&str; 2] = ["iframe", "script"];

/// Lowercased identity tokens of length > 3, split on non-word
/// boundaries.
pub async fn identity_tokens(host: &dyn HostTree, node: NodeId) -> Vec<String> {
    let attrs = host.attributes(node).await;
    let mut blob = String::new();
    for name in IDENTITY_ATTRIBUTES {
        if let Some(value) = attrs.get(name) {
            blob.push_str(value);
            blob.push(' ');
        }
    }
    // the data-ad-format attribute rides along with the other ad-slot
    // markers when present
    if let Some(value) = attrs.get("data-ad-format") {
        blob.push_str(value);
    }
    tokenize(&blob)
}

pub fn tokenize(blob: &str) -> Vec<String> {
    blob.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|token| token.len() > 3)
        .map(|token| token.to_string())
        .collect()
}

/// Hostname of the node's remote resource, when it has one.
pub async fn resource_host(host: &dyn HostTree, node: NodeId) -> Option<String> {
    let tag = host.tag_name(node).await?;
    if !RESOURCE_TAGS.contains(&tag.as_str()) {
        return None;
    }
    let src = host.attribute(node, "src").await?;
    let url = Url::parse(&src).ok()?;
    url.host_str().map(|h| h.to_string())
}

pub async fn size_sample(host: &dyn HostTree, node: NodeId) -> Option<SizeSample> {
    let bbox = host.bounding_box(node).await?;
    Some(SizeSample {
        width: bbox.width,
        height: bbox.height,
    })
}

/// Top/right position normalized to the viewport.
pub async fn position_sample(
    host: &dyn HostTree,
    node: NodeId,
    viewport: Viewport,
) -> Option<PositionSample> {
    let bbox = host.bounding_box(node).await?;
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }
    Some(PositionSample {
        top: bbox.y / viewport.height,
        right: (bbox.x + bbox.width) / viewport.width,
    })
}

/// Everything the pattern store can learn from one labeled node.
pub async fn collect_learn_sample(
    host: &dyn HostTree,
    node: NodeId,
    selector: Selector,
) -> LearnSample {
    let viewport = host.viewport().await;
    LearnSample {
        tokens: identity_tokens(host, node).await,
        selector: Some(selector),
        size: size_sample(host, node).await,
        position: position_sample(host, node, viewport).await,
        hostname: resource_host(host, node).await,
    }
}

/// Fixed-order numeric features for the external scorer.
pub async fn feature_vector(host: &dyn HostTree, node: NodeId) -> [f64; FEATURE_COUNT] {
    let bbox = host.bounding_box(node).await.unwrap_or_default();
    let attrs = host.attributes(node).await;
    let tag = host.tag_name(node).await.unwrap_or_default();
    let attr_len = |name: &str| attrs.get(name).map_or(0.0, |v| v.len() as f64);
    [
        bbox.width,
        bbox.height,
        bbox.y,
        bbox.x,
        attr_len("class"),
        attr_len("id"),
        if tag == "iframe" { 1.0 } else { 0.0 },
        if tag == "script" { 1.0 } else { 0.0 },
        attr_len("role"),
        attr_len("aria-label"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use adshield_core_types::Origin;
    use adshield_host_dom::{MemoryDom, NodeSpec};

    #[test]
    fn tokenizer_drops_short_tokens_and_lowercases() {
        let tokens = tokenize("Ad-Banner-300 top x promo_box");
        assert_eq!(tokens, vec!["banner", "promo_box"]);
    }

    #[tokio::test]
    async fn identity_tokens_cover_ad_data_attributes() {
        let dom = MemoryDom::new(Origin::new("example.com"), Viewport::default());
        dom.insert(
            None,
            &NodeSpec::new("ins")
                .with_classes(&["adsbygoogle"])
                .with_attr("data-ad-client", "ca-pub-1234567890"),
        );
        let node = dom.query(&Selector::new("ins")).await.unwrap()[0];
        let tokens = identity_tokens(&dom, node).await;
        assert!(tokens.contains(&"adsbygoogle".to_string()));
        assert!(tokens.contains(&"1234567890".to_string()));
    }

    #[tokio::test]
    async fn resource_host_ignores_malformed_urls() {
        let dom = MemoryDom::new(Origin::new("example.com"), Viewport::default());
        dom.insert(
            None,
            &NodeSpec::new("body")
                .with_child(NodeSpec::new("iframe").with_attr("src", "not a url"))
                .with_child(
                    NodeSpec::new("iframe").with_attr("src", "https://ads.example.net/slot"),
                )
                .with_child(NodeSpec::new("div").with_attr("src", "https://ads.example.net/")),
        );
        let frames = dom.query(&Selector::new("iframe")).await.unwrap();
        assert_eq!(resource_host(&dom, frames[0]).await, None);
        assert_eq!(
            resource_host(&dom, frames[1]).await,
            Some("ads.example.net".to_string())
        );
        // src on a non-resource tag carries no reputation signal
        let div = dom.query(&Selector::new("div")).await.unwrap()[0];
        assert_eq!(resource_host(&dom, div).await, None);
    }

    #[tokio::test]
    async fn feature_vector_has_the_documented_order() {
        let dom = MemoryDom::new(Origin::new("example.com"), Viewport::default());
        dom.insert(
            None,
            &NodeSpec::new("iframe")
                .with_id("fr")
                .with_classes(&["wide"])
                .with_attr("role", "img")
                .with_bbox(10.0, 20.0, 300.0, 250.0),
        );
        let node = dom.query(&Selector::new("#fr")).await.unwrap()[0];
        let features = feature_vector(&dom, node).await;
        assert_eq!(features[0], 300.0);
        assert_eq!(features[1], 250.0);
        assert_eq!(features[2], 20.0);
        assert_eq!(features[3], 10.0);
        assert_eq!(features[4], 4.0); // "wide"
        assert_eq!(features[5], 2.0); // "fr"
        assert_eq!(features[6], 1.0);
        assert_eq!(features[7], 0.0);
        assert_eq!(features[8], 3.0); // "img"
        assert_eq!(features[9], 0.0);
    }
}
