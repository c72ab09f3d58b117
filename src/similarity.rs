//! Context similarity
//!
//! Evidence recorded in a context that resembles the current one counts
//! fully; dissimilar contexts discount it.

use crate::error::{RecallError, Result};
use crate::sanitize::validate_context_pair;

/// Cosine similarity `dot(u,v) / (‖u‖·‖v‖)`
///
/// Returns exactly 0.0 when either vector has zero magnitude. Each vector is
/// divided by its largest absolute component first, so magnitudes near the
/// ends of the f64 range neither overflow nor underflow. The result is
/// clamped to [-1, 1].
pub fn cosine_similarity(u: &[f64], v: &[f64]) -> Result<f64> {
    validate_context_pair(Some(u), Some(v))?;

    let su = max_abs(u);
    let sv = max_abs(v);
    if su == 0.0 || sv == 0.0 {
        return Ok(0.0);
    }

    let (dot, nu, nv) = u
        .iter()
        .zip(v.iter())
        .map(|(a, b)| (a / su, b / sv))
        .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, nu, nv), (a, b)| {
            (dot + a * b, nu + a * a, nv + b * b)
        });

    // both norms are >= 1 after scaling
    let sim = dot / (nu.sqrt() * nv.sqrt());
    if !sim.is_finite() {
        return Err(RecallError::invalid(format!(
            "context similarity is not finite: {sim}"
        )));
    }
    Ok(sim.clamp(-1.0, 1.0))
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

/// Evidence weight for a new event
///
/// Both contexts present: cosine similarity. Otherwise 1.0.
pub fn evidence_weight(event_ctx: Option<&[f64]>, current_ctx: Option<&[f64]>) -> Result<f64> {
    match (event_ctx, current_ctx) {
        (Some(u), Some(v)) => cosine_similarity(u, v),
        _ => Ok(1.0),
    }
}
