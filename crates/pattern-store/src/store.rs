use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use adshield_kv_store::KvStore;

use crate::errors::PatternError;
use crate::model::{
    LearnSample, LearnedPatterns, GEOMETRY_CAP, LEARNING_RATE_DECAY, LEARNING_RATE_FLOOR,
    THRESHOLD_MAX, THRESHOLD_MIN,
};

const STORE_KEY: &str = "learned_patterns";

/// Owned learned-pattern state, persisted after every mutation.
///
/// All mutation happens from the single cooperative engine task; the
/// lock only guards against readers racing a write mid-update.
pub struct PatternStore {
    kv: Arc<dyn KvStore>,
    state: RwLock<LearnedPatterns>,
}

impl PatternStore {
    /// Load persisted patterns, falling back to defaults on missing or
    /// corrupt data.
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let state = match kv.get(STORE_KEY) {
            Some(value) => match serde_json::from_value::<LearnedPatterns>(value) {
                Ok(mut patterns) => {
                    patterns.clamp();
                    patterns
                }
                Err(err) => {
                    warn!("corrupt learned patterns, using defaults: {}", err);
                    LearnedPatterns::default()
                }
            },
            None => LearnedPatterns::default(),
        };
        Self {
            kv,
            state: RwLock::new(state),
        }
    }

    /// Incorporate one labeled node.
    ///
    /// Positive labels add to every field; negative labels remove from
    /// the set-typed fields only. Geometry sequences keep their prior
    /// positive samples: a false positive does not invalidate them.
    /// Silently a no-op when the sample carries no signal.
    pub fn learn(&self, sample: &LearnSample, is_ad: bool) {
        if sample.is_empty() {
            debug!("learn sample carried no signal, skipping");
            return;
        }
        {
            let mut state = self.state.write();
            if is_ad {
                for token in &sample.tokens {
                    state.keywords.insert(token.clone());
                }
                if let Some(selector) = &sample.selector {
                    if !selector.is_empty() {
                        state.selectors.insert(selector.as_str().to_string());
                    }
                }
                if let Some(hostname) = &sample.hostname {
                    state.domains.insert(hostname.clone());
                }
                if let Some(size) = sample.size {
                    state.sizes.push_back(size);
                    while state.sizes.len() > GEOMETRY_CAP {
                        state.sizes.pop_front();
                    }
                }
                if let Some(position) = sample.position {
                    state.positions.push_back(position);
                    while state.positions.len() > GEOMETRY_CAP {
                        state.positions.pop_front();
                    }
                }
            } else {
                for token in &sample.tokens {
                    state.keywords.remove(token);
                }
                if let Some(selector) = &sample.selector {
                    state.selectors.remove(selector.as_str());
                }
                if let Some(hostname) = &sample.hostname {
                    state.domains.remove(hostname);
                }
            }
        }
        self.persist();
    }

    /// Online threshold tuning from user feedback.
    ///
    /// A confirmed classification lowers the threshold (trust the
    /// heuristic more), a correction raises it; the learning rate then
    /// decays 5% so the loop settles as corrections become rare.
    pub fn process_feedback(&self, was_correct: bool) {
        {
            let mut state = self.state.write();
            let rate = state.learning_rate;
            state.confidence_threshold = if was_correct {
                (state.confidence_threshold - rate).max(THRESHOLD_MIN)
            } else {
                (state.confidence_threshold + rate).min(THRESHOLD_MAX)
            };
            state.learning_rate = (rate * LEARNING_RATE_DECAY).max(LEARNING_RATE_FLOOR);
        }
        self.persist();
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.state.read().confidence_threshold
    }

    pub fn learning_rate(&self) -> f64 {
        self.state.read().learning_rate
    }

    /// Point-in-time copy for a scoring pass.
    pub fn snapshot(&self) -> LearnedPatterns {
        self.state.read().clone()
    }

    fn persist(&self) {
        if let Err(err) = self.try_persist() {
            // the persistence collaborator owns durability; no retry here
            warn!("pattern persistence failed: {}", err);
        }
    }

    fn try_persist(&self) -> Result<(), PatternError> {
        let value = serde_json::to_value(&*self.state.read())
            .map_err(|err| PatternError::Encode(err.to_string()))?;
        self.kv
            .put(STORE_KEY, value)
            .map_err(|err| PatternError::Storage(err.to_string()))
    }
}
