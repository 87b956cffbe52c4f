use std::sync::Arc;

use serde_json::json;

use adshield_core_types::Selector;
use adshield_kv_store::{KvStore, MemoryKv};

use crate::model::{
    LearnSample, PositionSample, SizeSample, GEOMETRY_CAP, LEARNING_RATE_FLOOR, THRESHOLD_MAX,
    THRESHOLD_MIN,
};
use crate::store::PatternStore;

fn fresh_store() -> (Arc<MemoryKv>, PatternStore) {
    let kv = Arc::new(MemoryKv::new());
    let store = PatternStore::load(kv.clone());
    (kv, store)
}

fn ad_sample() -> LearnSample {
    LearnSample {
        tokens: vec!["banner".into(), "sponsored".into()],
        selector: Some(Selector::new(".ad-banner")),
        size: Some(SizeSample {
            width: 300.0,
            height: 250.0,
        }),
        position: Some(PositionSample {
            top: 0.1,
            right: 0.95,
        }),
        hostname: Some("ads.example.net".into()),
    }
}

#[test]
fn defaults_when_store_is_empty() {
    let (_, store) = fresh_store();
    assert_eq!(store.confidence_threshold(), 0.75);
    assert_eq!(store.learning_rate(), 0.1);
    assert!(store.snapshot().keywords.is_empty());
}

#[test]
fn corrupt_persisted_value_falls_back_to_defaults() {
    let kv = Arc::new(MemoryKv::new());
    kv.put("learned_patterns", json!("definitely not patterns"))
        .unwrap();
    let store = PatternStore::load(kv);
    assert_eq!(store.confidence_threshold(), 0.75);
}

#[test]
fn positive_label_populates_every_field_and_persists() {
    let (kv, store) = fresh_store();
    store.learn(&ad_sample(), true);

    let snapshot = store.snapshot();
    assert!(snapshot.keywords.contains("banner"));
    assert!(snapshot.selectors.contains(".ad-banner"));
    assert!(snapshot.domains.contains("ads.example.net"));
    assert_eq!(snapshot.sizes.len(), 1);
    assert_eq!(snapshot.positions.len(), 1);

    // survives a reload through the same collaborator
    let reloaded = PatternStore::load(kv);
    assert!(reloaded.snapshot().keywords.contains("sponsored"));
}

#[test]
fn negative_label_removes_sets_but_keeps_geometry() {
    let (_, store) = fresh_store();
    store.learn(&ad_sample(), true);
    store.learn(&ad_sample(), false);

    let snapshot = store.snapshot();
    assert!(snapshot.keywords.is_empty());
    assert!(snapshot.selectors.is_empty());
    assert!(snapshot.domains.is_empty());
    // geometry sequences are deliberately left untouched
    assert_eq!(snapshot.sizes.len(), 1);
    assert_eq!(snapshot.positions.len(), 1);
}

#[test]
fn empty_sample_is_a_silent_noop() {
    let (kv, store) = fresh_store();
    store.learn(&LearnSample::default(), true);
    assert!(kv.get("learned_patterns").is_none());
}

#[test]
fn geometry_sequences_evict_oldest_at_capacity() {
    let (_, store) = fresh_store();
    for i in 0..(GEOMETRY_CAP + 5) {
        let sample = LearnSample {
            size: Some(SizeSample {
                width: i as f64,
                height: 100.0,
            }),
            ..LearnSample::default()
        };
        store.learn(&sample, true);
    }
    let snapshot = store.snapshot();
    assert_eq!(snapshot.sizes.len(), GEOMETRY_CAP);
    assert_eq!(snapshot.sizes.front().unwrap().width, 5.0);
}

#[test]
fn correct_feedback_lowers_threshold_incorrect_raises_it() {
    let (_, store) = fresh_store();
    store.process_feedback(true);
    assert!((store.confidence_threshold() - 0.65).abs() < 1e-9);

    let before = store.confidence_threshold();
    store.process_feedback(false);
    assert!(store.confidence_threshold() > before);
}

#[test]
fn two_confirmations_hit_the_threshold_floor() {
    // 0.75 - 0.1 = 0.65, then 0.65 - 0.095 = 0.555 clamped to 0.6
    let (_, store) = fresh_store();
    store.process_feedback(true);
    assert!((store.confidence_threshold() - 0.65).abs() < 1e-9);
    store.process_feedback(true);
    assert_eq!(store.confidence_threshold(), THRESHOLD_MIN);
}

#[test]
fn threshold_and_rate_stay_bounded_under_any_sequence() {
    let (_, store) = fresh_store();
    for i in 0..200 {
        store.process_feedback(i % 3 == 0);
        let threshold = store.confidence_threshold();
        let rate = store.learning_rate();
        assert!((THRESHOLD_MIN..=THRESHOLD_MAX).contains(&threshold));
        assert!((LEARNING_RATE_FLOOR..=0.1).contains(&rate));
    }
    // after many events the decay has bottomed out
    assert_eq!(store.learning_rate(), LEARNING_RATE_FLOOR);
}

#[test]
fn persisted_out_of_range_threshold_is_clamped_on_load() {
    let kv = Arc::new(MemoryKv::new());
    kv.put(
        "learned_patterns",
        json!({
            "keywords": [],
            "selectors": [],
            "domains": [],
            "sizes": [],
            "positions": [],
            "confidence_threshold": 1.7,
            "learning_rate": 0.5
        }),
    )
    .unwrap();
    let store = PatternStore::load(kv);
    assert_eq!(store.confidence_threshold(), THRESHOLD_MAX);
    assert_eq!(store.learning_rate(), 0.1);
}
