//! Price forecasting - where is this price headed, and should the buyer
//! wait?
//!
//! Two complementary models run on every call: a random-walk Monte Carlo
//! simulation and a mean-reverting (Ornstein-Uhlenbeck) fit. The per-day
//! point forecast and confidence band come from the mean-reversion closed
//! form; fall/rise probabilities and tail risk come from the simulated
//! distribution. A simple, replaceable threshold policy turns those into
//! a timing recommendation.

pub mod mean_reversion;
pub mod monte_carlo;
pub mod trend;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ForecastConfig;
use crate::error::{EngineError, Result};
use crate::types::{
    ForecastResult, MonteCarloSummary, PriceBand, PriceHistory, RecommendedAction,
};

/// ~90% two-sided band half-width in standard deviations
const BAND_Z: f64 = 1.645;

/// Forecast price movement over `horizon_days` using the injected random
/// source.
///
/// A seeded source makes the output fully reproducible; pass
/// `StdRng::from_entropy()` (or use [`forecast_seeded`]) otherwise.
pub fn forecast<R: Rng>(
    history: &PriceHistory,
    horizon_days: u32,
    rng: &mut R,
    config: &ForecastConfig,
) -> Result<ForecastResult> {
    if horizon_days == 0 {
        return Err(EngineError::InvalidParameter(
            "forecast horizon must be at least one day".to_string(),
        ));
    }
    if horizon_days > config.max_horizon_days {
        return Err(EngineError::InvalidParameter(format!(
            "forecast horizon {horizon_days} exceeds maximum {}",
            config.max_horizon_days
        )));
    }

    let mc = monte_carlo::simulate(history, horizon_days, config.num_paths, rng)?;
    let ou = mean_reversion::OuModel::fit(history)?;

    let mut point_forecast = Vec::with_capacity(horizon_days as usize);
    let mut confidence_band = Vec::with_capacity(horizon_days as usize);
    for day in 1..=horizon_days {
        let expected = ou.expected_price(day);
        let half_width = BAND_Z * ou.variance(day).sqrt();
        point_forecast.push(expected);
        confidence_band.push(PriceBand {
            lower: (expected - half_width).max(0.0),
            upper: expected + half_width,
        });
    }

    let recommended_action = recommend(&mc, config);
    debug!(
        horizon_days,
        p_increase = mc.probability_of_increase,
        p_decrease = mc.probability_of_decrease,
        action = %recommended_action,
        "forecast complete"
    );

    let mean_reversion = ou.summarize(horizon_days);
    Ok(ForecastResult {
        horizon_days,
        point_forecast,
        confidence_band,
        recommended_action,
        probability_price_falls: mc.probability_of_decrease,
        probability_price_rises: mc.probability_of_increase,
        value_at_risk: mc.worst_case_if_wait.max(0.0),
        expected_regret_if_wait: (-mc.expected_savings_if_wait).max(0.0),
        expected_savings_if_wait: mc.expected_savings_if_wait,
        optimal_booking_day: mean_reversion.optimal_booking_day,
        mean_reversion,
        monte_carlo: mc,
    })
}

/// Convenience wrapper running [`forecast`] on a seeded `StdRng`
pub fn forecast_seeded(
    history: &PriceHistory,
    horizon_days: u32,
    seed: u64,
    config: &ForecastConfig,
) -> Result<ForecastResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    forecast(history, horizon_days, &mut rng, config)
}

/// Threshold policy over the simulated distribution
fn recommend(mc: &MonteCarloSummary, config: &ForecastConfig) -> RecommendedAction {
    if mc.probability_of_increase > config.book_now_threshold {
        RecommendedAction::BookNow
    } else if mc.probability_of_decrease > config.wait_threshold {
        RecommendedAction::Wait
    } else {
        RecommendedAction::Monitor
    }
}
