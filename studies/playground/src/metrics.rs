//! Synthetic metric curves.
//!
//! Per-epoch values are a pure function of the epoch ratio. Each final value
//! mixes in its own uniform draw, scaled by the learning rate or dropout, and
//! is kept at or past the end of the per-epoch curve.

use rand::Rng;
use serde::{ Deserialize, Serialize };

use crate::params::Parameters;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub accuracy: f64,
    pub loss: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::zeroed()
    }
}

impl Metrics {
    pub const fn zeroed() -> Self {
        Metrics { accuracy: 0.0, loss: 0.0, precision: 0.0, recall: 0.0, f1_score: 0.0 }
    }

    /// Values reported at the start of a run, before the first epoch.
    pub const fn baseline() -> Self {
        Metrics { accuracy: 0.0, loss: 1.0, precision: 0.0, recall: 0.0, f1_score: 0.0 }
    }

    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Accuracy => self.accuracy,
            MetricKind::Loss => self.loss,
            MetricKind::Precision => self.precision,
            MetricKind::Recall => self.recall,
            MetricKind::F1Score => self.f1_score,
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        unit(self.accuracy) &&
            unit(self.precision) &&
            unit(self.recall) &&
            unit(self.f1_score) &&
            self.loss.is_finite() &&
            self.loss >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Accuracy,
    Loss,
    Precision,
    Recall,
    F1Score,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Accuracy,
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::F1Score,
        MetricKind::Loss,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Accuracy => "Accuracy",
            MetricKind::Loss => "Loss",
            MetricKind::Precision => "Precision",
            MetricKind::Recall => "Recall",
            MetricKind::F1Score => "F1 Score",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::Loss)
    }
}

const CURVE_CEILING: f64 = 0.95;
const LOSS_FLOOR: f64 = 0.1;

/// Metrics reported after `epoch` of `total` epochs.
pub fn epoch_metrics(epoch: u32, total: u32) -> Metrics {
    let ratio = if total == 0 { 0.0 } else { ((epoch as f64) / (total as f64)).clamp(0.0, 1.0) };
    Metrics {
        accuracy: (0.5 + ratio * 0.4).min(CURVE_CEILING),
        loss: (1.0 - ratio * 0.85).max(LOSS_FLOOR),
        precision: (0.4 + ratio * 0.5).min(CURVE_CEILING),
        recall: (0.3 + ratio * 0.6).min(CURVE_CEILING),
        f1_score: (0.35 + ratio * 0.55).min(CURVE_CEILING),
    }
}

/// Final metrics for a finished run, given one uniform draw in `[0, 1)` per
/// metric, in `accuracy, loss, precision, recall, f1` order.
pub fn final_metrics_with(params: &Parameters, draws: [f64; 5]) -> Metrics {
    let [accuracy, loss, precision, recall, f1] = draws.map(|u| u.clamp(0.0, 1.0));
    let lr = params.learning_rate;
    let dropout = params.dropout;
    let end = epoch_metrics(1, 1);

    Metrics {
        accuracy: unit(0.85 + lr * 5.0 * accuracy, end.accuracy),
        loss: (0.15 - lr * 2.0 * loss).min(end.loss).max(0.0),
        precision: unit(0.82 + dropout * precision, end.precision),
        recall: unit(0.8 + dropout * recall, end.recall),
        f1_score: unit(0.83 + lr * 3.0 * f1, end.f1_score),
    }
}

pub fn final_metrics<R: Rng + ?Sized>(params: &Parameters, rng: &mut R) -> Metrics {
    let draws: [f64; 5] = std::array::from_fn(|_| rng.gen::<f64>());
    final_metrics_with(params, draws)
}

fn unit(value: f64, floor: f64) -> f64 {
    value.max(floor).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_curve_is_monotonic_for_every_length() {
        for total in 1..=50 {
            let mut prev = epoch_metrics(0, total);
            for epoch in 1..=total {
                let next = epoch_metrics(epoch, total);
                assert!(next.accuracy >= prev.accuracy);
                assert!(next.precision >= prev.precision);
                assert!(next.recall >= prev.recall);
                assert!(next.f1_score >= prev.f1_score);
                assert!(next.loss <= prev.loss);
                assert!(next.is_within_bounds());
                prev = next;
            }
        }
    }

    #[test]
    fn test_curve_is_pure() {
        assert_eq!(epoch_metrics(3, 7), epoch_metrics(3, 7));
        let m = epoch_metrics(5, 10);
        assert!((m.accuracy - 0.7).abs() < 1e-12);
        assert!((m.loss - 0.575).abs() < 1e-12);
    }

    #[test]
    fn test_final_metrics_stay_in_bounds_at_extremes() {
        let mut params = Parameters::default();
        params.learning_rate = 0.1;
        params.dropout = 0.5;
        for u in [0.0, 0.25, 0.5, 0.999_999] {
            let m = final_metrics_with(&params, [u; 5]);
            assert!(m.is_within_bounds(), "{m:?}");
            assert!(m.accuracy >= epoch_metrics(1, 1).accuracy);
            assert!(m.loss <= epoch_metrics(1, 1).loss);
        }
    }

    #[test]
    fn test_final_metrics_replay_with_same_seed() {
        let params = Parameters::default();
        let a = final_metrics(&params, &mut ChaCha8Rng::seed_from_u64(7));
        let b = final_metrics(&params, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_final_metrics_draw_each_metric_separately() {
        let params = Parameters { learning_rate: 0.1, dropout: 0.5, ..Parameters::default() };
        let m = final_metrics_with(&params, [0.0, 0.0, 1.0, 0.0, 1.0]);
        assert!((m.accuracy - 0.9).abs() < 1e-12);
        assert!((m.loss - 0.15).abs() < 1e-12);
        assert_eq!(m.precision, 1.0);
        assert!((m.recall - 0.9).abs() < 1e-12);
        assert!((m.f1_score - 1.0).abs() < 1e-12);

        // a seeded rng spreads its draws over the metrics
        let m = final_metrics(&params, &mut ChaCha8Rng::seed_from_u64(11));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let draws: [f64; 5] = std::array::from_fn(|_| rng.gen::<f64>());
        assert_eq!(m, final_metrics_with(&params, draws));
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }
}
