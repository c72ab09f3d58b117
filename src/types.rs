//! Common Types and Constants
//!
//! Shared data structures used by the predictor, the registry and the
//! configuration layer.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

use crate::error::RecallError;

// ==================== Constants ====================

pub const SECONDS_PER_HOUR: f64 = 3600.0;

pub const SECONDS_PER_DAY: f64 = 24.0 * SECONDS_PER_HOUR;

/// Built-in mode names
pub const MODE_READING: &str = "reading";
pub const MODE_FLASHCARD: &str = "flashcard";
pub const MODE_QUIZ: &str = "quiz";

/// Half-life of passive reading exposure (12 h)
pub const READING_HALF_LIFE_SECS: f64 = 12.0 * SECONDS_PER_HOUR;

/// Half-life of flashcard drills (3 days)
pub const FLASHCARD_HALF_LIFE_SECS: f64 = 3.0 * SECONDS_PER_DAY;

/// Half-life of quiz attempts (7 days)
pub const QUIZ_HALF_LIFE_SECS: f64 = 7.0 * SECONDS_PER_DAY;

/// Half-life assigned to a mode first seen through `update` (1 day)
pub const UNSEEN_MODE_HALF_LIFE_SECS: f64 = SECONDS_PER_DAY;

/// SGD step size
pub const DEFAULT_LEARNING_RATE: f64 = 0.05;

/// Initial θ_S and θ_F of every mode
pub const DEFAULT_MODE_WEIGHT: f64 = 0.80;

/// Initial global bias θ₀ (low baseline recall)
pub const DEFAULT_BIAS: f64 = -1.5;

/// Convert a half-life in seconds to a per-second decay constant: λ = ln 2 / h
pub fn decay_rate_from_half_life(half_life_secs: f64) -> f64 {
    LN_2 / half_life_secs
}

/// Inverse of [`decay_rate_from_half_life`]. Infinite for λ = 0.
pub fn half_life_from_decay_rate(lambda: f64) -> f64 {
    LN_2 / lambda
}

/// Lower bound of a reported recall probability
pub const MIN_PROBABILITY: f64 = f64::EPSILON;

/// Upper bound of a reported recall probability
pub const MAX_PROBABILITY: f64 = 1.0 - f64::EPSILON;

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// σ(logit) kept strictly inside (0, 1)
///
/// σ rounds to exactly 1.0 above a logit of about 37 and to 0.0 below -709.
#[inline]
pub fn recall_probability(logit: f64) -> f64 {
    sigmoid(logit).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

// ==================== Event Types ====================

/// Binary outcome of an interaction
///
/// Serialized as the integer label `1` (success) or `0` (failure).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Outcome {
    Failure,
    Success,
}

impl Outcome {
    pub fn from_bool(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Regression label: 1.0 for success, 0.0 for failure
    pub fn label(self) -> f64 {
        match self {
            Outcome::Success => 1.0,
            Outcome::Failure => 0.0,
        }
    }
}

impl From<bool> for Outcome {
    fn from(success: bool) -> Self {
        Outcome::from_bool(success)
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => 1,
            Outcome::Failure => 0,
        }
    }
}

impl TryFrom<u8> for Outcome {
    type Error = RecallError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Outcome::Success),
            0 => Ok(Outcome::Failure),
            other => Err(RecallError::invalid(format!(
                "outcome must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl TryFrom<i64> for Outcome {
    type Error = RecallError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Outcome::Success),
            0 => Ok(Outcome::Failure),
            other => Err(RecallError::invalid(format!(
                "outcome must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// One interaction with a word, as supplied by the capturing collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Interaction mode, e.g. "reading"
    pub mode: String,
    pub outcome: Outcome,
    /// Wall-clock time in seconds
    pub timestamp: f64,
    /// Semantic context of the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_context: Option<Vec<f64>>,
    /// Semantic context at recording time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<Vec<f64>>,
}

impl InteractionEvent {
    pub fn new(mode: impl Into<String>, outcome: Outcome, timestamp: f64) -> Self {
        Self {
            mode: mode.into(),
            outcome,
            timestamp,
            event_context: None,
            current_context: None,
        }
    }

    pub fn with_contexts(mut self, event_context: Vec<f64>, current_context: Vec<f64>) -> Self {
        self.event_context = Some(event_context);
        self.current_context = Some(current_context);
        self
    }
}

// ==================== Model Types ====================

/// Decayed success / failure tallies of one mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecayedTally {
    pub success: f64,
    pub failure: f64,
}

impl DecayedTally {
    pub fn scale(&mut self, factor: f64) {
        self.success *= factor;
        self.failure *= factor;
    }

    pub fn add(&mut self, outcome: Outcome, weight: f64) {
        match outcome {
            Outcome::Success => self.success += weight,
            Outcome::Failure => self.failure += weight,
        }
    }
}

/// Logistic coefficients of one mode
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeWeights {
    /// θ_S, applied to the success tally
    pub success: f64,
    /// θ_F, applied (negated) to the failure tally
    pub failure: f64,
}

impl ModeWeights {
    pub fn uniform(value: f64) -> Self {
        Self {
            success: value,
            failure: value,
        }
    }

    /// Contribution of this mode to the logit: θ_S·S − θ_F·F
    #[inline]
    pub fn contribution(&self, tally: &DecayedTally) -> f64 {
        self.success * tally.success - self.failure * tally.failure
    }
}

impl Default for ModeWeights {
    fn default() -> Self {
        Self::uniform(DEFAULT_MODE_WEIGHT)
    }
}

/// Recall prediction result
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecallPrediction {
    /// Linear score fed to the sigmoid
    pub logit: f64,
    /// Recall probability (0, 1)
    pub recall_probability: f64,
    /// Time through which tallies were decayed
    pub cursor: f64,
}

// ==================== Tests ====================
