//! Recall Predictor - per-word multi-mode forgetting model
//!
//! Core theory:
//! - Each interaction mode (reading, flashcard, quiz, ...) keeps a pair of
//!   exponentially decayed tallies of successful and failed recalls
//! - Tallies feed a logistic model whose weights are trained online, one SGD
//!   step per observed interaction
//! - Decay is applied lazily: tallies are stored as of a cursor and brought
//!   forward on demand
//!
//! Mathematical formulas:
//! - Tally at time t: S_m(t) = Σ_j sim_j · exp(-λ_m · (t - t_j))   (successes)
//!                    F_m(t) = Σ_j sim_j · exp(-λ_m · (t - t_j))   (failures)
//!   - λ_m = ln 2 / half-life of mode m
//!   - sim_j: cosine similarity of event and current context (1.0 if absent)
//!
//! - Recall probability: P = σ(θ₀ + Σ_m (θ_S[m]·S_m − θ_F[m]·F_m))
//!
//! - SGD step after recording an event with label y:
//!   - e = y − P
//!   - θ₀ += η·e,  θ_S[m] += η·e·S_m,  θ_F[m] −= η·e·F_m
//!
//! The predictor holds no lock. Share one instance across threads only behind
//! a mutex; see [`crate::registry::RecallRegistry`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::config::PredictorConfig;
use crate::error::{RecallError, Result};
use crate::sanitize::{
    ensure_finite_time, has_invalid_values, validate_context, validate_context_pair, validate_mode,
};
use crate::similarity::evidence_weight;
use crate::types::{
    recall_probability, DecayedTally, InteractionEvent, ModeWeights, Outcome, RecallPrediction,
};

// ==================== Constants ====================

/// Snapshot format version
const SNAPSHOT_VERSION: &str = "1.0.0";

/// Initial cursor (seconds)
const INITIAL_CURSOR: f64 = 0.0;

// ==================== Data Structures ====================

/// Per-mode state: decay constant, tallies and coefficients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeState {
    pub mode: String,
    /// λ, per second
    pub decay_rate: f64,
    pub tally: DecayedTally,
    pub weights: ModeWeights,
}

/// Serializable predictor state
///
/// The predictor never writes this anywhere; it exists so the owner can keep
/// a word warm across restarts instead of replaying its history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictorSnapshot {
    pub version: String,
    pub config: PredictorConfig,
    /// Modes in registration order
    pub modes: Vec<ModeState>,
    pub bias: f64,
    pub cursor: f64,
    pub update_count: u64,
}

// ==================== Recall Predictor ====================

/// Recall probability estimator for a single word
///
/// Use cases:
/// - Estimate how likely a learner is to recall a word right now
/// - Order flashcards or pick review times from the estimate
/// - Fold heterogeneous evidence (reading, drills, quizzes) into one score
#[derive(Clone, Debug)]
pub struct RecallPredictor {
    config: PredictorConfig,
    /// Registration order; the logit is summed in this order
    modes: Vec<ModeState>,
    index: HashMap<String, usize>,
    bias: f64,
    cursor: f64,
    update_count: u64,
}

impl Default for RecallPredictor {
    fn default() -> Self {
        Self::build(PredictorConfig::default())
    }
}

impl RecallPredictor {
    /// Create a predictor from a validated configuration
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PredictorConfig) -> Self {
        let mut predictor = Self {
            bias: config.initial_bias,
            modes: Vec::new(),
            index: HashMap::new(),
            cursor: INITIAL_CURSOR,
            update_count: 0,
            config,
        };
        for mode in predictor.config.initial_modes() {
            predictor.register_mode(&mode);
        }
        predictor
    }

    /// Rebuild a cold predictor from its full interaction history
    ///
    /// Events are applied in timestamp order; ties keep their input order.
    pub fn replay(config: PredictorConfig, events: &[InteractionEvent]) -> Result<Self> {
        let mut predictor = Self::new(config)?;

        for event in events {
            ensure_finite_time("event_time", event.timestamp)?;
        }
        let mut ordered: Vec<&InteractionEvent> = events.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        for event in ordered {
            predictor.record(event)?;
        }
        debug!(
            events = events.len(),
            cursor = predictor.cursor,
            "replayed interaction history"
        );
        Ok(predictor)
    }

    /// Restore from a snapshot taken with [`RecallPredictor::snapshot`]
    pub fn from_snapshot(snapshot: PredictorSnapshot) -> Result<Self> {
        snapshot
            .config
            .validate()
            .map_err(|e| RecallError::Snapshot(e.to_string()))?;

        if !snapshot.bias.is_finite() || !snapshot.cursor.is_finite() {
            return Err(RecallError::Snapshot(
                "bias and cursor must be finite".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(snapshot.modes.len());
        for (i, state) in snapshot.modes.iter().enumerate() {
            if state.mode.trim().is_empty() {
                return Err(RecallError::Snapshot("empty mode name".to_string()));
            }
            let values = [
                state.decay_rate,
                state.tally.success,
                state.tally.failure,
                state.weights.success,
                state.weights.failure,
            ];
            if has_invalid_values(&values) || state.decay_rate < 0.0 {
                return Err(RecallError::Snapshot(format!(
                    "mode {} has invalid numeric state",
                    state.mode
                )));
            }
            if index.insert(state.mode.clone(), i).is_some() {
                return Err(RecallError::Snapshot(format!(
                    "duplicate mode {}",
                    state.mode
                )));
            }
        }

        Ok(Self {
            config: snapshot.config,
            modes: snapshot.modes,
            index,
            bias: snapshot.bias,
            cursor: snapshot.cursor,
            update_count: snapshot.update_count,
        })
    }

    pub fn snapshot(&self) -> PredictorSnapshot {
        PredictorSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            config: self.config.clone(),
            modes: self.modes.clone(),
            bias: self.bias,
            cursor: self.cursor,
            update_count: self.update_count,
        }
    }

    // ==================== Decay ====================

    /// Bring every tally forward to `now`
    ///
    /// A `now` at or before the cursor leaves the state untouched.
    pub fn advance_to(&mut self, now: f64) -> Result<()> {
        let now = ensure_finite_time("now", now)?;
        self.decay_to(now);
        Ok(())
    }

    fn decay_to(&mut self, t: f64) {
        let dt = t - self.cursor;
        if dt <= 0.0 {
            return;
        }
        for state in &mut self.modes {
            let factor = (-state.decay_rate * dt).exp();
            state.tally.scale(factor);
        }
        self.cursor = t;
    }

    // ==================== Read-out ====================

    /// Decay to `now`, then return the recall probability
    ///
    /// Mutates the tallies and cursor. `current_context` does not enter the
    /// formula; it is only checked for finiteness.
    pub fn probability(&mut self, now: f64, current_context: Option<&[f64]>) -> Result<f64> {
        validate_context("current_context", current_context)?;
        self.advance_to(now)?;
        Ok(self.probability_at_cursor())
    }

    /// Like [`probability`](Self::probability) with the logit and cursor attached
    pub fn predict(
        &mut self,
        now: f64,
        current_context: Option<&[f64]>,
    ) -> Result<RecallPrediction> {
        validate_context("current_context", current_context)?;
        self.advance_to(now)?;
        let logit = self.logit();
        Ok(RecallPrediction {
            logit,
            recall_probability: recall_probability(logit),
            cursor: self.cursor,
        })
    }

    /// Probability from the stored tallies, without decaying them
    ///
    /// Always strictly inside (0, 1), even for saturated logits.
    pub fn probability_at_cursor(&self) -> f64 {
        recall_probability(self.logit())
    }

    fn logit(&self) -> f64 {
        self.modes
            .iter()
            .fold(self.bias, |acc, state| acc + state.weights.contribution(&state.tally))
    }

    /// Simulated recall attempt: succeeds with the current recall probability
    pub fn recall<R: Rng + ?Sized>(
        &mut self,
        now: f64,
        current_context: Option<&[f64]>,
        rng: &mut R,
    ) -> Result<bool> {
        let p = self.probability(now, current_context)?;
        Ok(rng.gen::<f64>() < p)
    }

    // ==================== Online update ====================

    /// Record one interaction and take one SGD step
    ///
    /// All arguments are validated before any state changes. An `event_time`
    /// earlier than the cursor applies no decay and records the event at full
    /// weight, as though it happened at the cursor.
    pub fn update(
        &mut self,
        mode: &str,
        outcome: Outcome,
        event_time: f64,
        event_context: Option<&[f64]>,
        current_context: Option<&[f64]>,
    ) -> Result<()> {
        validate_mode(mode)?;
        let event_time = ensure_finite_time("event_time", event_time)?;
        validate_context_pair(event_context, current_context)?;
        let sim = evidence_weight(event_context, current_context)?;

        let idx = self.register_mode(mode);

        if event_time < self.cursor {
            debug!(
                mode,
                event_time,
                cursor = self.cursor,
                "out-of-order event recorded without backdating"
            );
        }
        self.decay_to(event_time);

        self.modes[idx].tally.add(outcome, sim);

        let p = self.probability_at_cursor();
        let error = outcome.label() - p;
        let lr = self.config.learning_rate;

        self.bias += lr * error;
        for state in &mut self.modes {
            state.weights.success += lr * error * state.tally.success;
            state.weights.failure -= lr * error * state.tally.failure;
        }
        self.update_count += 1;

        trace!(
            mode,
            success = outcome.is_success(),
            sim,
            p,
            error,
            bias = self.bias,
            "applied interaction"
        );
        Ok(())
    }

    /// [`update`](Self::update) driven by an [`InteractionEvent`]
    pub fn record(&mut self, event: &InteractionEvent) -> Result<()> {
        self.update(
            &event.mode,
            event.outcome,
            event.timestamp,
            event.event_context.as_deref(),
            event.current_context.as_deref(),
        )
    }

    /// Register-if-absent; returns the mode's position
    fn register_mode(&mut self, mode: &str) -> usize {
        if let Some(&idx) = self.index.get(mode) {
            return idx;
        }
        let decay_rate = self.config.decay_rate_for(mode);
        let idx = self.modes.len();
        self.modes.push(ModeState {
            mode: mode.to_string(),
            decay_rate,
            tally: DecayedTally::default(),
            weights: ModeWeights::uniform(self.config.initial_mode_weight),
        });
        self.index.insert(mode.to_string(), idx);
        debug!(mode, decay_rate, "registered mode");
        idx
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Mode names in registration order
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(|s| s.mode.as_str())
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    pub fn has_mode(&self, mode: &str) -> bool {
        self.index.contains_key(mode)
    }

    fn mode_state(&self, mode: &str) -> Option<&ModeState> {
        self.index.get(mode).map(|&i| &self.modes[i])
    }

    pub fn decay_rate(&self, mode: &str) -> Option<f64> {
        self.mode_state(mode).map(|s| s.decay_rate)
    }

    /// Tallies as of the cursor
    pub fn tally(&self, mode: &str) -> Option<DecayedTally> {
        self.mode_state(mode).map(|s| s.tally)
    }

    pub fn weights(&self, mode: &str) -> Option<ModeWeights> {
        self.mode_state(mode).map(|s| s.weights)
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

// ==================== Tests ====================
