//! Replays a short study history for one word and prints the recall curve.
//!
//! Run with: RUST_LOG=debug cargo run --bin recall-demo

use danci_recall::logging::{init_tracing, log_level_from_env};
use danci_recall::{
    Outcome, PredictorConfig, RecallPredictor, Result, SECONDS_PER_DAY, SECONDS_PER_HOUR,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

fn main() -> Result<()> {
    init_tracing(&log_level_from_env());

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let config = match std::env::var("RECALL_CONFIG") {
        Ok(json) => PredictorConfig::from_json_str(&json)?,
        Err(_) => PredictorConfig::default(),
    };
    let mut predictor = RecallPredictor::new(config)?;

    // day 0: reading success
    predictor.update("reading", Outcome::Success, now, None, None)?;
    // 8h later: reading failure
    predictor.update("reading", Outcome::Failure, now + 8.0 * SECONDS_PER_HOUR, None, None)?;
    // 24h later: flashcard success
    predictor.update("flashcard", Outcome::Success, now + SECONDS_PER_DAY, None, None)?;

    let mut rng = ChaCha8Rng::seed_from_u64(2025);
    for day in [1.0, 2.0, 3.0, 5.0, 7.0] {
        let at = now + day * SECONDS_PER_DAY;
        let p = predictor.probability(at, None)?;
        let recalled = predictor.recall(at, None, &mut rng)?;
        info!(day, p, recalled, "recall estimate");
        println!("day {day:>3}: p = {p:.3}  simulated recall = {recalled}");
    }

    Ok(())
}
