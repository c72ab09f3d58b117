//! Predictor configuration
//!
//! An immutable table handed to every predictor at construction. Decay rates
//! are per-second constants, λ = ln 2 / half-life.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RecallError, Result};
use crate::types::{
    decay_rate_from_half_life, DEFAULT_BIAS, DEFAULT_LEARNING_RATE, DEFAULT_MODE_WEIGHT,
    FLASHCARD_HALF_LIFE_SECS, MODE_FLASHCARD, MODE_QUIZ, MODE_READING, QUIZ_HALF_LIFE_SECS,
    READING_HALF_LIFE_SECS, UNSEEN_MODE_HALF_LIFE_SECS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Initial mode list. Empty means the built-in list.
    pub modes: Vec<String>,
    /// Per-mode λ overrides, merged over the built-in table
    pub decay_rates: HashMap<String, f64>,
    /// Half-life given to a mode with no configured λ
    pub unseen_half_life_secs: f64,
    pub learning_rate: f64,
    /// Initial θ_S and θ_F
    pub initial_mode_weight: f64,
    /// Initial θ₀
    pub initial_bias: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            decay_rates: HashMap::new(),
            unseen_half_life_secs: UNSEEN_MODE_HALF_LIFE_SECS,
            learning_rate: DEFAULT_LEARNING_RATE,
            initial_mode_weight: DEFAULT_MODE_WEIGHT,
            initial_bias: DEFAULT_BIAS,
        }
    }
}

pub fn default_modes() -> Vec<String> {
    vec![
        MODE_READING.to_string(),
        MODE_FLASHCARD.to_string(),
        MODE_QUIZ.to_string(),
    ]
}

/// Built-in λ for the named modes
pub fn builtin_decay_rate(mode: &str) -> Option<f64> {
    match mode {
        MODE_READING => Some(decay_rate_from_half_life(READING_HALF_LIFE_SECS)),
        MODE_FLASHCARD => Some(decay_rate_from_half_life(FLASHCARD_HALF_LIFE_SECS)),
        MODE_QUIZ => Some(decay_rate_from_half_life(QUIZ_HALF_LIFE_SECS)),
        _ => None,
    }
}

impl PredictorConfig {
    /// Parse from JSON; every field is optional.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_decay_rate(mut self, mode: impl Into<String>, lambda: f64) -> Self {
        self.decay_rates.insert(mode.into(), lambda);
        self
    }

    pub fn with_half_life(self, mode: impl Into<String>, half_life_secs: f64) -> Self {
        self.with_decay_rate(mode, decay_rate_from_half_life(half_life_secs))
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Initial modes, deduplicated, in order. Falls back to the built-in list.
    pub fn initial_modes(&self) -> Vec<String> {
        if self.modes.is_empty() {
            return default_modes();
        }
        let mut out: Vec<String> = Vec::with_capacity(self.modes.len());
        for mode in &self.modes {
            if !out.contains(mode) {
                out.push(mode.clone());
            }
        }
        out
    }

    /// λ for a mode: override, then built-in, then the unseen-mode default
    pub fn decay_rate_for(&self, mode: &str) -> f64 {
        self.decay_rates
            .get(mode)
            .copied()
            .or_else(|| builtin_decay_rate(mode))
            .unwrap_or_else(|| decay_rate_from_half_life(self.unseen_half_life_secs))
    }

    pub fn validate(&self) -> Result<()> {
        for mode in &self.modes {
            if mode.trim().is_empty() {
                return Err(RecallError::InvalidConfig(
                    "mode names must not be empty".to_string(),
                ));
            }
        }
        for (mode, &lambda) in &self.decay_rates {
            if !lambda.is_finite() || lambda < 0.0 {
                return Err(RecallError::InvalidConfig(format!(
                    "decay rate for {mode} must be finite and >= 0, got {lambda}"
                )));
            }
        }
        if !self.unseen_half_life_secs.is_finite() || self.unseen_half_life_secs <= 0.0 {
            return Err(RecallError::InvalidConfig(format!(
                "unseen_half_life_secs must be finite and > 0, got {}",
                self.unseen_half_life_secs
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(RecallError::InvalidConfig(format!(
                "learning_rate must be finite and >= 0, got {}",
                self.learning_rate
            )));
        }
        if !self.initial_mode_weight.is_finite() || !self.initial_bias.is_finite() {
            return Err(RecallError::InvalidConfig(
                "initial weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
