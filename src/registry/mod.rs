//! Keyed predictor registry
//!
//! One [`RecallPredictor`] per word, shared across request handlers. Each
//! word sits behind its own mutex so the decay → accumulate → gradient
//! sequence of one word is never interleaved, while different words are
//! updated in parallel.

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PredictorConfig;
use crate::error::Result;
use crate::predictor::{PredictorSnapshot, RecallPredictor};
use crate::types::InteractionEvent;

type Slot = Arc<Mutex<RecallPredictor>>;

pub struct RecallRegistry {
    config: PredictorConfig,
    /// Fresh predictor cloned for every new word
    template: RecallPredictor,
    items: RwLock<HashMap<String, Slot>>,
}

impl RecallRegistry {
    pub fn new(config: PredictorConfig) -> Result<Self> {
        let template = RecallPredictor::new(config.clone())?;
        Ok(Self {
            config,
            template,
            items: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    fn slot(&self, item: &str) -> Option<Slot> {
        self.items.read().get(item).cloned()
    }

    fn slot_or_insert(&self, item: &str) -> Slot {
        if let Some(slot) = self.slot(item) {
            return slot;
        }
        let mut items = self.items.write();
        items
            .entry(item.to_string())
            .or_insert_with(|| {
                debug!(item, "created predictor");
                Arc::new(Mutex::new(self.template.clone()))
            })
            .clone()
    }

    /// Feed one interaction into the word's predictor, creating it if needed
    pub fn record(&self, item: &str, event: &InteractionEvent) -> Result<()> {
        let slot = self.slot_or_insert(item);
        let mut predictor = slot.lock();
        predictor.record(event)
    }

    /// Recall probability of a word at `now`
    ///
    /// An unknown word gets the zero-history probability; no entry is created.
    pub fn probability(
        &self,
        item: &str,
        now: f64,
        current_context: Option<&[f64]>,
    ) -> Result<f64> {
        let Some(slot) = self.slot(item) else {
            return self.template.clone().probability(now, current_context);
        };
        let mut predictor = slot.lock();
        predictor.probability(now, current_context)
    }

    /// Probabilities of many words at `now`, computed in parallel
    pub fn batch_probability(&self, items: &[String], now: f64) -> Result<Vec<f64>> {
        items
            .par_iter()
            .map(|item| self.probability(item, now, None))
            .collect()
    }

    pub fn snapshot(&self, item: &str) -> Option<PredictorSnapshot> {
        let slot = self.slot(item)?;
        let predictor = slot.lock();
        Some(predictor.snapshot())
    }

    /// Install a previously saved predictor, replacing any existing one
    pub fn restore(&self, item: &str, snapshot: PredictorSnapshot) -> Result<()> {
        let predictor = RecallPredictor::from_snapshot(snapshot)?;
        self.items
            .write()
            .insert(item.to_string(), Arc::new(Mutex::new(predictor)));
        info!(item, "restored predictor from snapshot");
        Ok(())
    }

    /// Rebuild a word from its interaction history, replacing any existing one
    pub fn rehydrate(&self, item: &str, events: &[InteractionEvent]) -> Result<()> {
        let predictor = RecallPredictor::replay(self.config.clone(), events)?;
        self.items
            .write()
            .insert(item.to_string(), Arc::new(Mutex::new(predictor)));
        info!(item, events = events.len(), "rehydrated predictor");
        Ok(())
    }

    pub fn remove(&self, item: &str) -> bool {
        self.items.write().remove(item).is_some()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.read().contains_key(item)
    }

    pub fn items(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Default for RecallRegistry {
    fn default() -> Self {
        Self {
            config: PredictorConfig::default(),
            template: RecallPredictor::default(),
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, SECONDS_PER_DAY};
    use std::thread;

    const T0: f64 = 1_700_000_000.0;

    fn baseline() -> f64 {
        1.0 / (1.0 + 1.5_f64.exp())
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = RecallRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PredictorConfig::default().with_learning_rate(-1.0);
        assert!(RecallRegistry::new(config).is_err());
    }

    #[test]
    fn test_unknown_item_returns_baseline_without_insert() {
        let registry = RecallRegistry::default();
        assert_eq!(registry.probability("苹果", T0, None).unwrap(), baseline());
        assert!(!registry.contains("苹果"));
    }

    #[test]
    fn test_record_creates_and_matches_standalone() {
        let registry = RecallRegistry::default();
        let event = InteractionEvent::new("quiz", Outcome::Success, T0);
        registry.record("apple", &event).unwrap();

        let mut standalone = RecallPredictor::default();
        standalone.record(&event).unwrap();

        let now = T0 + SECONDS_PER_DAY;
        assert_eq!(
            registry.probability("apple", now, None).unwrap(),
            standalone.probability(now, None).unwrap()
        );
        assert_eq!(registry.items(), vec!["apple".to_string()]);
    }

    #[test]
    fn test_items_are_isolated() {
        let registry = RecallRegistry::default();
        registry
            .record("apple", &InteractionEvent::new("quiz", Outcome::Success, T0))
            .unwrap();
        registry
            .record("pear", &InteractionEvent::new("quiz", Outcome::Failure, T0))
            .unwrap();

        let now = T0 + 60.0;
        let apple = registry.probability("apple", now, None).unwrap();
        let pear = registry.probability("pear", now, None).unwrap();
        assert!(apple > baseline());
        assert!(pear < baseline());
    }

    #[test]
    fn test_batch_probability_preserves_order() {
        let registry = RecallRegistry::default();
        registry
            .record("a", &InteractionEvent::new("quiz", Outcome::Success, T0))
            .unwrap();
        let items = vec!["a".to_string(), "missing".to_string()];
        let probs = registry.batch_probability(&items, T0 + 1.0).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs[0] > probs[1]);
        assert_eq!(probs[1], baseline());
    }

    #[test]
    fn test_batch_probability_propagates_errors() {
        let registry = RecallRegistry::default();
        let items = vec!["a".to_string()];
        assert!(registry.batch_probability(&items, f64::NAN).is_err());
    }

    #[test]
    fn test_snapshot_restore_and_remove() {
        let registry = RecallRegistry::default();
        registry
            .record("apple", &InteractionEvent::new("reading", Outcome::Success, T0))
            .unwrap();
        let snapshot = registry.snapshot("apple").unwrap();

        assert!(registry.remove("apple"));
        assert!(!registry.remove("apple"));
        assert!(registry.snapshot("apple").is_none());

        registry.restore("apple", snapshot.clone()).unwrap();
        assert_eq!(registry.snapshot("apple"), Some(snapshot));
    }

    #[test]
    fn test_rehydrate_replaces_state() {
        let registry = RecallRegistry::default();
        let history = vec![
            InteractionEvent::new("reading", Outcome::Success, T0),
            InteractionEvent::new("quiz", Outcome::Success, T0 + 10.0),
        ];
        registry.rehydrate("apple", &history).unwrap();
        assert_eq!(registry.snapshot("apple").unwrap().update_count, 2);
    }

    #[test]
    fn test_concurrent_records_on_same_item() {
        let registry = Arc::new(RecallRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for j in 0..50 {
                        let event = InteractionEvent::new(
                            "flashcard",
                            Outcome::from((i + j) % 3 != 0),
                            T0 + (j as f64),
                        );
                        registry.record("shared", &event).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot("shared").unwrap().update_count, 400);
        let p = registry.probability("shared", T0 + 100.0, None).unwrap();
        assert!(p > 0.0 && p < 1.0);
    }
}
