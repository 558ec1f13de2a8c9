//! Statistics helpers
//!
//! Small numeric pieces shared by the classifiers:
//! - `Gaussian`: batch-fit normal distribution with a floored std dev
//! - `RunningGaussian`: Welford online mean/variance for incremental training
//! - `normalize_log_scores`: log-sum-exp normalization of label scores

use std::collections::HashMap;

/// Minimum standard deviation for amount distributions.
///
/// Categories whose amounts never vary (a single sample, or identical
/// charges) would otherwise produce a degenerate zero-variance Gaussian.
pub const MIN_STD_DEV: f64 = 0.01;

/// Normal distribution over transaction amounts for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

impl Gaussian {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self {
            mean,
            std_dev: std_dev.max(MIN_STD_DEV),
        }
    }

    /// Fit from a sample, using the population variance (divide by n).
    ///
    /// An empty slice fits a unit-mass distribution at zero with the
    /// minimum spread.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::new(0.0, MIN_STD_DEV);
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self::new(mean, variance.sqrt())
    }

    /// Log of the normal density at `x`.
    pub fn log_density(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std_dev;
        -0.5 * ((2.0 * std::f64::consts::PI).ln() + 2.0 * self.std_dev.ln() + z * z)
    }
}

/// Online mean/variance accumulator (Welford's algorithm).
///
/// Used by the incremental subscription trainer, where amounts arrive one
/// labeled sample at a time and the full history is never materialized.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningGaussian {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningGaussian {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Snapshot as a `Gaussian`, with the population variance and the
    /// usual spread floor. Fewer than two samples fall back to the floor.
    pub fn to_gaussian(&self) -> Gaussian {
        if self.count < 2 {
            return Gaussian::new(self.mean, MIN_STD_DEV);
        }
        let variance = self.m2 / self.count as f64;
        Gaussian::new(self.mean, variance.sqrt())
    }
}

/// Turn per-label log-scores into a normalized probability distribution.
///
/// Subtracts the maximum log-score before exponentiating so that extreme
/// scores neither overflow nor collapse to 0/0. An empty input or an
/// all-`-inf` input yields an empty map rather than NaN entries.
pub fn normalize_log_scores(scores: HashMap<String, f64>) -> HashMap<String, f64> {
    let max = scores
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return HashMap::new();
    }

    let exp: HashMap<String, f64> = scores
        .into_iter()
        .map(|(label, score)| (label, (score - max).exp()))
        .collect();
    let total: f64 = exp.values().sum();

    exp.into_iter()
        .map(|(label, weight)| (label, weight / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_population_variance() {
        let g = Gaussian::fit(&[2.0, 4.0, 6.0]);
        assert!((g.mean - 4.0).abs() < 1e-12);
        // Population variance: ((2-4)^2 + 0 + (6-4)^2) / 3 = 8/3
        assert!((g.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_fit_floors_std_dev() {
        let g = Gaussian::fit(&[15.99, 15.99, 15.99]);
        assert_eq!(g.std_dev, MIN_STD_DEV);

        let single = Gaussian::fit(&[42.0]);
        assert_eq!(single.std_dev, MIN_STD_DEV);
    }

    #[test]
    fn test_log_density_peaks_at_mean() {
        let g = Gaussian::new(50.0, 5.0);
        assert!(g.log_density(50.0) > g.log_density(60.0));
        assert!(g.log_density(50.0) > g.log_density(40.0));
    }

    #[test]
    fn test_running_gaussian_matches_batch_fit() {
        let values = [12.0, 15.5, 9.25, 30.0, 14.0];
        let mut running = RunningGaussian::default();
        for v in values {
            running.push(v);
        }
        let batch = Gaussian::fit(&values);
        let online = running.to_gaussian();
        assert!((online.mean - batch.mean).abs() < 1e-9);
        assert!((online.std_dev - batch.std_dev).abs() < 1e-9);
    }

    #[test]
    fn test_running_gaussian_few_samples() {
        let mut running = RunningGaussian::default();
        assert_eq!(running.to_gaussian().std_dev, MIN_STD_DEV);
        running.push(100.0);
        let g = running.to_gaussian();
        assert_eq!(g.mean, 100.0);
        assert_eq!(g.std_dev, MIN_STD_DEV);
    }

    #[test]
    fn test_normalize_log_scores_sums_to_one() {
        let scores = HashMap::from([
            ("a".to_string(), -3.0),
            ("b".to_string(), -1.0),
            ("c".to_string(), -2.0),
        ]);
        let probs = normalize_log_scores(scores);
        let total: f64 = probs.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(probs["b"] > probs["c"] && probs["c"] > probs["a"]);
    }

    #[test]
    fn test_normalize_log_scores_extreme_values() {
        // Scores that would overflow a naive exp()/sum(exp()) pass
        let scores = HashMap::from([
            ("a".to_string(), 800.0),
            ("b".to_string(), 790.0),
        ]);
        let probs = normalize_log_scores(scores);
        assert!(probs.values().all(|p| p.is_finite() && *p >= 0.0));
        assert!((probs.values().sum::<f64>() - 1.0).abs() < 1e-12);

        let tiny = HashMap::from([
            ("a".to_string(), -5000.0),
            ("b".to_string(), -5001.0),
        ]);
        let probs = normalize_log_scores(tiny);
        assert!((probs.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_log_scores_degenerate_input() {
        assert!(normalize_log_scores(HashMap::new()).is_empty());
        let all_neg_inf = HashMap::from([("a".to_string(), f64::NEG_INFINITY)]);
        assert!(normalize_log_scores(all_neg_inf).is_empty());
    }
}
