//! Random-walk Monte Carlo price simulation
//!
//! Drift and volatility are estimated from the history's consecutive
//! percent changes, then N independent paths are simulated over the
//! horizon. Normal deviates come from a standard normal sampled through
//! the injected random source: a seeded source gives bit-identical
//! output on every run. Paths are fanned out with rayon after one
//! sub-seed per path is drawn sequentially from the injected source, so
//! results do not depend on thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use statrs::distribution::Normal;

use crate::error::{EngineError, Result};
use crate::stats;
use crate::types::{DistributionSummary, MonteCarloSummary, PriceHistory};

/// Simulate `num_paths` random-walk paths over `horizon_days`.
///
/// Each step applies `price * (1 + (mu - sigma^2/2) + sigma * Z)` with
/// Z standard normal. Terminal and per-path minimum prices are aggregated
/// into nearest-rank percentile summaries.
pub fn simulate<R: Rng>(
    history: &PriceHistory,
    horizon_days: u32,
    num_paths: usize,
    rng: &mut R,
) -> Result<MonteCarloSummary> {
    if history.len() < PriceHistory::MIN_FORECAST_POINTS {
        return Err(EngineError::InsufficientData {
            context: "Monte Carlo simulation",
            required: PriceHistory::MIN_FORECAST_POINTS,
            actual: history.len(),
        });
    }
    if horizon_days == 0 {
        return Err(EngineError::InvalidParameter(
            "horizon must be at least one day".to_string(),
        ));
    }
    if num_paths == 0 {
        return Err(EngineError::InvalidParameter(
            "at least one simulation path is required".to_string(),
        ));
    }

    let prices = history.prices();
    // Length gate above guarantees a latest price exists
    let current = history.latest_price().expect("history is non-empty");

    let returns = stats::percent_returns(&prices);
    let mu = stats::mean(&returns);
    let sigma = stats::sample_std_dev(&returns);
    let drift = mu - sigma * sigma / 2.0;

    // Parameters are constants, construction cannot fail
    let normal = Normal::new(0.0, 1.0).expect("standard normal is well-formed");

    // One sub-seed per path, drawn sequentially from the injected source
    let seeds: Vec<u64> = (0..num_paths).map(|_| rng.gen()).collect();

    let outcomes: Vec<(f64, f64)> = seeds
        .into_par_iter()
        .map(|seed| {
            let mut path_rng = StdRng::seed_from_u64(seed);
            let mut price = current;
            let mut minimum = current;
            for _ in 0..horizon_days {
                let z: f64 = path_rng.sample(normal);
                price *= 1.0 + drift + sigma * z;
                price = price.max(0.0);
                minimum = minimum.min(price);
            }
            (price, minimum)
        })
        .collect();

    let mut terminals: Vec<f64> = outcomes.iter().map(|o| o.0).collect();
    let mut minima: Vec<f64> = outcomes.iter().map(|o| o.1).collect();

    let above = terminals.iter().filter(|&&t| t > current).count();
    let below = terminals.iter().filter(|&&t| t < current).count();

    let terminal = summarize(&mut terminals);
    let path_minimum = summarize(&mut minima);

    Ok(MonteCarloSummary {
        paths: num_paths,
        horizon_days,
        probability_of_increase: above as f64 / num_paths as f64,
        probability_of_decrease: below as f64 / num_paths as f64,
        expected_savings_if_wait: current - terminal.mean,
        worst_case_if_wait: terminal.p90 - current,
        best_case_if_wait: current - terminal.p10,
        terminal,
        path_minimum,
    })
}

fn summarize(values: &mut [f64]) -> DistributionSummary {
    let mean = stats::mean(values);
    values.sort_by(|a, b| a.partial_cmp(b).expect("simulated prices are finite"));
    DistributionSummary {
        p10: stats::percentile_sorted(values, 0.10),
        p25: stats::percentile_sorted(values, 0.25),
        median: stats::percentile_sorted(values, 0.50),
        p75: stats::percentile_sorted(values, 0.75),
        p90: stats::percentile_sorted(values, 0.90),
        mean,
    }
}
