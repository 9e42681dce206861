//! Configuration types for the scoring engine

use serde::Deserialize;

/// Per-method weights for the anomaly aggregator.
///
/// The weights sum to 1.0 across all methods. A method that lacks
/// sufficient data contributes nothing and its weight is NOT redistributed
/// to the rest, so aggregate confidence drops when fewer signals are
/// available.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodWeights {
    pub z_score: f64,
    pub iqr: f64,
    pub historical: f64,
    pub discount: f64,
    pub pattern: f64,
}

impl MethodWeights {
    pub fn sum(&self) -> f64 {
        self.z_score + self.iqr + self.historical + self.discount + self.pattern
    }
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self {
            z_score: 0.30,
            iqr: 0.20,
            historical: 0.20,
            discount: 0.15,
            pattern: 0.15,
        }
    }
}

/// Anomaly detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    /// Z-score magnitude below the mean required to flag an outlier
    pub z_score_threshold: f64,
    /// Aggregate confidence required to call an offer anomalous
    pub anomaly_threshold: f64,
    /// Minimum percent-below-reference for the historical-deviation and
    /// discount-ratio methods to fire (0.40 = 40% below)
    pub deviation_floor: f64,
    /// Per-method aggregation weights
    pub weights: MethodWeights,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: 2.5,
            anomaly_threshold: 0.85,
            deviation_floor: 0.40,
            weights: MethodWeights::default(),
        }
    }
}

/// Forecasting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Monte Carlo paths per forecast
    pub num_paths: usize,
    /// Default simulation horizon in days
    pub default_horizon_days: u32,
    /// Largest accepted horizon in days
    pub max_horizon_days: u32,
    /// P(increase) above this recommends booking now
    pub book_now_threshold: f64,
    /// P(decrease) above this recommends waiting
    pub wait_threshold: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            num_paths: 10_000,
            default_horizon_days: 90,
            max_horizon_days: 365,
            book_now_threshold: 0.6,
            wait_threshold: 0.6,
        }
    }
}

/// Per-dimension weights for the composite ranker.
///
/// Policy constants, not derived quantities. Must sum to 1.0; `rank`
/// rejects a config where they do not.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingWeights {
    pub anomaly: f64,
    pub exclusivity: f64,
    pub historical_value: f64,
    pub quality_value: f64,
    pub cancellation_flexibility: f64,
    pub availability_urgency: f64,
}

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.anomaly
            + self.exclusivity
            + self.historical_value
            + self.quality_value
            + self.cancellation_flexibility
            + self.availability_urgency
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            anomaly: 0.40,
            exclusivity: 0.25,
            historical_value: 0.15,
            quality_value: 0.10,
            cancellation_flexibility: 0.05,
            availability_urgency: 0.05,
        }
    }
}

/// Ranking configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingConfig {
    pub weights: RankingWeights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((MethodWeights::default().sum() - 1.0).abs() < 1e-9);
        assert!((RankingWeights::default().sum() - 1.0).abs() < 1e-9);
    }
}
