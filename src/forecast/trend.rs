//! Trend estimation over a price history
//!
//! Ordinary least squares of price against sequence index (index, not
//! date, so irregular sampling does not skew the fit), plus an optional
//! monthly seasonal decomposition for histories long enough to span most
//! of a year.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::stats;
use crate::types::{PriceHistory, TrendDirection, TrendStrength};

/// Fixed extrapolation horizons, in periods ahead of the last observation
pub const PROJECTION_HORIZONS: [u32; 3] = [30, 60, 90];

/// |slope / intercept| below this is considered flat
const STABLE_RATIO: f64 = 0.001;

/// Monthly means above/below the global mean by this fraction are
/// peak/valley months
const SEASONAL_BAND: f64 = 0.15;

/// Days of calendar span required before monthly buckets are meaningful
const MIN_SEASONAL_SPAN_DAYS: i64 = 300;

/// Extrapolated price at a fixed horizon.
///
/// Pure line extension; the further out the horizon, the less the fit
/// says about it. Callers should treat the 60- and 90-period values as
/// low-confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendProjection {
    pub periods_ahead: u32,
    pub price: f64,
}

/// Fitted linear trend over a price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub projections: Vec<TrendProjection>,
}

/// Fit a linear trend to the history.
///
/// Requires `PriceHistory::MIN_FORECAST_POINTS` observations.
pub fn estimate_trend(history: &PriceHistory) -> Result<TrendAnalysis> {
    if history.len() < PriceHistory::MIN_FORECAST_POINTS {
        return Err(EngineError::InsufficientData {
            context: "trend estimation",
            required: PriceHistory::MIN_FORECAST_POINTS,
            actual: history.len(),
        });
    }

    let prices = history.prices();
    // Length is checked above, so the fit cannot fail
    let fit = stats::ols_by_index(&prices).expect("history length already validated");

    let direction = if fit.intercept == 0.0 {
        TrendDirection::Stable
    } else if (fit.slope / fit.intercept).abs() < STABLE_RATIO {
        TrendDirection::Stable
    } else if fit.slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let strength = if fit.r_squared.abs() > 0.7 {
        TrendStrength::Strong
    } else if fit.r_squared.abs() > 0.4 {
        TrendStrength::Moderate
    } else {
        TrendStrength::Weak
    };

    let last_index = (prices.len() - 1) as f64;
    let projections = PROJECTION_HORIZONS
        .iter()
        .map(|&h| TrendProjection {
            periods_ahead: h,
            price: (fit.intercept + fit.slope * (last_index + h as f64)).max(0.0),
        })
        .collect();

    Ok(TrendAnalysis {
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        direction,
        strength,
        projections,
    })
}

/// Average price for one calendar month bucket
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonthlyAverage {
    /// Calendar month, 1-12
    pub month: u32,
    pub mean_price: f64,
    pub observations: usize,
}

/// Monthly seasonal structure of a price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalAnalysis {
    pub global_mean: f64,
    pub monthly: Vec<MonthlyAverage>,
    /// Normalized mean absolute deviation of monthly means from the
    /// global mean; 0 = no seasonal structure
    pub seasonality_strength: f64,
    /// Months more than 15% above the global mean
    pub peak_months: Vec<u32>,
    /// Months more than 15% below the global mean
    pub valley_months: Vec<u32>,
}

/// Decompose a history into calendar-month averages.
///
/// Requires `PriceHistory::MIN_SEASONAL_POINTS` observations spanning at
/// least most of a year, so every bucket has a chance to be populated.
pub fn seasonal_decomposition(history: &PriceHistory) -> Result<SeasonalAnalysis> {
    if history.len() < PriceHistory::MIN_SEASONAL_POINTS {
        return Err(EngineError::InsufficientData {
            context: "seasonal decomposition",
            required: PriceHistory::MIN_SEASONAL_POINTS,
            actual: history.len(),
        });
    }
    let span = history.span_days();
    if span < MIN_SEASONAL_SPAN_DAYS {
        return Err(EngineError::InsufficientData {
            context: "seasonal decomposition span (days)",
            required: MIN_SEASONAL_SPAN_DAYS as usize,
            actual: span.max(0) as usize,
        });
    }

    let mut sums = [0.0f64; 12];
    let mut counts = [0usize; 12];
    for point in history.points() {
        let idx = (point.date.month() - 1) as usize;
        sums[idx] += point.price;
        counts[idx] += 1;
    }

    let global_mean = stats::mean(&history.prices());
    let monthly: Vec<MonthlyAverage> = (0..12)
        .filter(|&i| counts[i] > 0)
        .map(|i| MonthlyAverage {
            month: (i + 1) as u32,
            mean_price: sums[i] / counts[i] as f64,
            observations: counts[i],
        })
        .collect();

    let (strength, peak_months, valley_months) = if global_mean > 0.0 {
        let mad = stats::mean(
            &monthly
                .iter()
                .map(|m| (m.mean_price - global_mean).abs())
                .collect::<Vec<_>>(),
        );
        let peaks = monthly
            .iter()
            .filter(|m| m.mean_price > global_mean * (1.0 + SEASONAL_BAND))
            .map(|m| m.month)
            .collect();
        let valleys = monthly
            .iter()
            .filter(|m| m.mean_price < global_mean * (1.0 - SEASONAL_BAND))
            .map(|m| m.month)
            .collect();
        (mad / global_mean, peaks, valleys)
    } else {
        (0.0, Vec::new(), Vec::new())
    };

    Ok(SeasonalAnalysis {
        global_mean,
        monthly,
        seasonality_strength: strength,
        peak_months,
        valley_months,
    })
}
