//! Ornstein-Uhlenbeck mean-reversion model
//!
//! The long-run mean is the sample mean of the history; the reversion
//! speed comes from a zero-intercept regression of successive price
//! differences on the distance from that mean. The closed-form variance
//! is undefined at zero reversion speed, so that case falls back to the
//! random-walk limit explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::stats;
use crate::types::{MeanReversionSummary, PriceHistory};

/// Reversion speeds below this are treated as zero (no detectable pull)
const THETA_EPSILON: f64 = 1e-8;

/// Fitted mean-reversion model for one price history
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OuModel {
    /// Long-run mean the price reverts toward
    pub long_run_mean: f64,
    /// Reversion speed per day, clamped to >= 0
    pub reversion_speed: f64,
    /// Volatility of daily price changes
    pub volatility: f64,
    /// Most recent observed price
    pub current_price: f64,
}

impl OuModel {
    /// Fit the model to a history.
    ///
    /// Requires `PriceHistory::MIN_FORECAST_POINTS` observations. A flat
    /// or trending series without measurable pull toward its mean fits
    /// with reversion speed 0.
    pub fn fit(history: &PriceHistory) -> Result<Self> {
        if history.len() < PriceHistory::MIN_FORECAST_POINTS {
            return Err(EngineError::InsufficientData {
                context: "mean-reversion fit",
                required: PriceHistory::MIN_FORECAST_POINTS,
                actual: history.len(),
            });
        }

        let prices = history.prices();
        let long_run_mean = stats::mean(&prices);
        let current_price = *prices.last().expect("history is non-empty");

        // Regress d_i = p_{i+1} - p_i on (mean - p_i), no intercept:
        // theta = sum(d_i * x_i) / sum(x_i^2)
        let mut num = 0.0;
        let mut den = 0.0;
        for w in prices.windows(2) {
            let x = long_run_mean - w[0];
            num += (w[1] - w[0]) * x;
            den += x * x;
        }
        let reversion_speed = if den > 0.0 { (num / den).max(0.0) } else { 0.0 };

        let diffs: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let volatility = stats::sample_std_dev(&diffs);

        Ok(Self {
            long_run_mean,
            reversion_speed,
            volatility,
            current_price,
        })
    }

    /// Expected price `t` days out: mean + (current - mean) * e^(-theta t)
    pub fn expected_price(&self, t: u32) -> f64 {
        let decay = (-self.reversion_speed * t as f64).exp();
        self.long_run_mean + (self.current_price - self.long_run_mean) * decay
    }

    /// Forecast variance `t` days out.
    ///
    /// Closed form sigma^2 (1 - e^(-2 theta t)) / (2 theta); at theta ~ 0
    /// the expression is undefined and the random-walk limit sigma^2 t
    /// applies.
    pub fn variance(&self, t: u32) -> f64 {
        let t = t as f64;
        let sigma_sq = self.volatility * self.volatility;
        if self.reversion_speed < THETA_EPSILON {
            return sigma_sq * t;
        }
        sigma_sq * (1.0 - (-2.0 * self.reversion_speed * t).exp()) / (2.0 * self.reversion_speed)
    }

    /// Horizon day (1-based) with the lowest expected price, with that price
    pub fn optimal_booking_day(&self, horizon_days: u32) -> (u32, f64) {
        let mut best_day = 1;
        let mut best_price = self.expected_price(1);
        for day in 2..=horizon_days {
            let price = self.expected_price(day);
            if price < best_price {
                best_price = price;
                best_day = day;
            }
        }
        (best_day, best_price)
    }

    /// Summary over a fixed horizon for the forecast report
    pub fn summarize(&self, horizon_days: u32) -> MeanReversionSummary {
        let (optimal_booking_day, optimal_booking_price) = self.optimal_booking_day(horizon_days);
        MeanReversionSummary {
            long_run_mean: self.long_run_mean,
            reversion_speed: self.reversion_speed,
            volatility: self.volatility,
            optimal_booking_day,
            optimal_booking_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn daily_history(prices: &[f64]) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        PriceHistory::from_pairs(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (start + chrono::Days::new(i as u64), p)),
        )
    }

    /// Synthetic AR(1) path pulled toward `mean` with strength `b`
    fn reverting_prices(mean: f64, b: f64, start: f64, n: usize) -> Vec<f64> {
        let mut prices = vec![start];
        for i in 1..n {
            let prev = prices[i - 1];
            let noise = 0.4 * ((i % 7) as f64 - 3.0);
            prices.push(prev + b * (mean - prev) + noise);
        }
        prices
    }

    #[test]
    fn test_fit_recovers_reversion_speed() {
        let prices = reverting_prices(200.0, 0.3, 150.0, 120);
        let model = OuModel::fit(&daily_history(&prices)).unwrap();

        assert!((model.long_run_mean - 200.0).abs() < 10.0);
        assert!(model.reversion_speed > 0.1 && model.reversion_speed < 0.5);
    }

    #[test]
    fn test_expected_price_decays_toward_mean() {
        let prices = reverting_prices(200.0, 0.3, 150.0, 120);
        let model = OuModel::fit(&daily_history(&prices)).unwrap();

        let near = model.expected_price(1);
        let far = model.expected_price(60);
        // Far-out expectation sits closer to the long-run mean
        assert!((far - model.long_run_mean).abs() < (near - model.long_run_mean).abs());
    }

    #[test]
    fn test_variance_zero_theta_fallback() {
        // Strictly trending series: no pull toward the mean, theta clamps to 0
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let model = OuModel::fit(&daily_history(&prices)).unwrap();

        assert_eq!(model.reversion_speed, 0.0);
        let sigma_sq = model.volatility * model.volatility;
        assert!((model.variance(10) - sigma_sq * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_variance_saturates_under_reversion() {
        let prices = reverting_prices(200.0, 0.3, 150.0, 120);
        let model = OuModel::fit(&daily_history(&prices)).unwrap();

        // Variance grows toward the stationary level instead of linearly
        let v30 = model.variance(30);
        let v90 = model.variance(90);
        assert!(v90 >= v30);
        let stationary = model.volatility.powi(2) / (2.0 * model.reversion_speed);
        assert!(v90 <= stationary + 1e-9);
    }

    #[test]
    fn test_optimal_day_below_mean_is_immediate() {
        // Current price below the long-run mean: expectation only rises,
        // so the cheapest expected day is the first one
        let prices = reverting_prices(200.0, 0.25, 240.0, 80);
        let mut below = prices.clone();
        *below.last_mut().unwrap() = 170.0;
        let model = OuModel::fit(&daily_history(&below)).unwrap();

        let (day, _) = model.optimal_booking_day(90);
        assert_eq!(day, 1);
    }

    #[test]
    fn test_optimal_day_above_mean_is_late() {
        // Current price above the mean: expectation decays down the whole
        // horizon, so the optimum is the last day
        let prices = reverting_prices(200.0, 0.25, 200.0, 80);
        let mut above = prices.clone();
        *above.last_mut().unwrap() = 260.0;
        let model = OuModel::fit(&daily_history(&above)).unwrap();

        let (day, price) = model.optimal_booking_day(90);
        assert_eq!(day, 90);
        assert!(price < 260.0);
    }

    #[test]
    fn test_fit_rejects_short_history() {
        let err = OuModel::fit(&daily_history(&[100.0, 101.0])).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { required: 5, .. }));
    }

    #[test]
    fn test_flat_history_is_degenerate_but_defined() {
        let model = OuModel::fit(&daily_history(&[180.0; 10])).unwrap();
        assert_eq!(model.reversion_speed, 0.0);
        assert_eq!(model.volatility, 0.0);
        assert_eq!(model.expected_price(30), 180.0);
        assert_eq!(model.variance(30), 0.0);
    }
}
