//! Small numeric helpers shared by the memory layers.

use moodmem_models::intensity::RAW_INTENSITY_MAX;

/// Population variance of normalized intensities at which stability hits zero.
const MAX_STABLE_VARIANCE: f64 = 0.25;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    Some(squares / values.len() as f64)
}

/// Stability in [0, 1]: 1 means every sample had the same intensity.
pub fn stability(values: &[f64]) -> Option<f64> {
    population_variance(values)
        .map(|variance| (1.0 - (variance / MAX_STABLE_VARIANCE).min(1.0)).clamp(0.0, 1.0))
}

/// Running mean after adding one sample to `count` earlier samples.
pub fn incremental_mean(previous_mean: f64, previous_count: u64, sample: f64) -> f64 {
    let count = previous_count as f64 + 1.0;
    previous_mean + (sample - previous_mean) / count
}

/// Topic score after decaying the old score and adding one occurrence.
pub fn decayed_score(previous: f64, sample: f64, decay: f64, cap: f64) -> f64 {
    (previous * decay + sample).min(cap)
}

/// Exponential moving average, seeded by the first sample.
pub fn ema(previous: Option<f64>, sample: f64, alpha: f64) -> f64 {
    match previous {
        Some(previous) => (1.0 - alpha) * previous + alpha * sample,
        None => sample,
    }
}

/// Volatility contribution of one raw intensity change, in [0, 1].
pub fn volatility_sample(raw_delta: f64) -> f64 {
    (raw_delta.abs() / RAW_INTENSITY_MAX).min(1.0)
}

/// Outcome inferred from a raw intensity change when none was reported.
///
/// A drop in intensity reads as the persona helping.
pub fn outcome_from_delta(raw_delta: Option<f64>) -> f64 {
    match raw_delta {
        Some(delta) if delta < 0.0 => 1.0,
        Some(delta) if delta > 0.0 => -1.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_stability_bounds() {
        assert!(stability(&[]).is_none());
        assert!(approx(stability(&[0.4, 0.4, 0.4]).unwrap(), 1.0));
        // Variance of {0, 1} is 0.25, the point where stability bottoms out.
        assert!(approx(stability(&[0.0, 1.0]).unwrap(), 0.0));
        let value = stability(&[0.2, 0.6]).unwrap();
        assert!(approx(value, 1.0 - 0.04 / 0.25));
    }

    #[test]
    fn test_incremental_mean_matches_batch_mean() {
        let mut running = 0.0;
        let samples = [0.8, 0.4, 0.6, 1.0];
        for (count, sample) in samples.iter().enumerate() {
            running = incremental_mean(running, count as u64, *sample);
        }
        assert!(approx(running, mean(&samples).unwrap()));
    }

    #[test]
    fn test_decayed_score_is_capped() {
        assert!(approx(decayed_score(0.0, 1.0, 0.9, 10.0), 1.0));
        assert!(approx(decayed_score(1.0, 1.0, 0.9, 10.0), 1.9));
        let mut score = 0.0;
        for _ in 0..200 {
            score = decayed_score(score, 1.0, 0.9, 10.0);
        }
        assert!(score <= 10.0);
        assert!(approx(decayed_score(9.9, 1.0, 1.0, 10.0), 10.0));
    }

    #[test]
    fn test_ema_seed_and_blend() {
        assert!(approx(ema(None, 0.4, 0.1), 0.4));
        assert!(approx(ema(Some(0.4), 1.0, 0.1), 0.46));
    }

    #[test]
    fn test_volatility_sample_and_outcome() {
        assert!(approx(volatility_sample(-2.0), 0.4));
        assert!(approx(volatility_sample(9.0), 1.0));
        assert!(approx(outcome_from_delta(Some(-2.0)), 1.0));
        assert!(approx(outcome_from_delta(Some(0.5)), -1.0));
        assert!(approx(outcome_from_delta(Some(0.05)), -1.0));
        assert!(approx(outcome_from_delta(Some(-0.05)), 1.0));
        assert!(approx(outcome_from_delta(Some(0.0)), 0.0));
        assert!(approx(outcome_from_delta(None), 0.0));
    }
}
