//! Core types used throughout DealScout
//!
//! Defines the common data structures for offers, price samples, price
//! histories, and the derived verdicts the engine produces.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of an offer, used for the exclusivity subscore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    /// Private inventory not visible on the open market
    Exclusive,
    /// Member-only or login-gated rate
    Member,
    /// Negotiated partner rate
    Partner,
    /// Openly published rate
    Public,
}

impl Default for SourceTag {
    fn default() -> Self {
        SourceTag::Public
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTag::Exclusive => write!(f, "EXCLUSIVE"),
            SourceTag::Member => write!(f, "MEMBER"),
            SourceTag::Partner => write!(f, "PARTNER"),
            SourceTag::Public => write!(f, "PUBLIC"),
        }
    }
}

/// Quality attributes of the underlying product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityAttributes {
    /// Average review rating on a 0-5 scale
    pub rating: Option<f64>,
    /// Number of reviews behind the rating
    pub review_count: Option<u32>,
    /// Number of listed amenities
    pub amenity_count: Option<u32>,
}

/// A priced offer as fetched from an upstream provider.
///
/// Immutable once constructed; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedOffer {
    /// Provider-assigned offer ID
    pub id: String,
    /// Quoted price in the account currency
    pub quoted_price: f64,
    /// Crossed-out original price, when the provider lists one
    pub listed_original_price: Option<f64>,
    /// Quality attributes of the underlying product
    pub quality: QualityAttributes,
    /// Last day the offer can be cancelled without penalty
    pub cancellation_deadline: Option<NaiveDate>,
    /// Units left at this price, when the provider reports scarcity
    pub availability_count: Option<u32>,
    /// Where the offer came from
    pub source: SourceTag,
}

/// An unordered set of comparable current-market prices for the same
/// product class at the same point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSample {
    prices: Vec<f64>,
}

impl PriceSample {
    pub fn new(prices: Vec<f64>) -> Self {
        Self { prices }
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// One observed (date, price) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A date-ordered price series for one property.
///
/// Points are sorted by date on construction so downstream regressions can
/// rely on sequence order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Minimum points for forecasting (trend fit, Monte Carlo, mean reversion)
    pub const MIN_FORECAST_POINTS: usize = 5;
    /// Minimum points for historical-deviation anomaly scoring
    pub const MIN_HISTORICAL_ANOMALY_POINTS: usize = 10;
    /// Minimum points for seasonal decomposition
    pub const MIN_SEASONAL_POINTS: usize = 30;

    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    /// Build a history from (date, price) pairs
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, price)| PricePoint { date, price })
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent observed price
    pub fn latest_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    /// Calendar days between the first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }

    /// Number of distinct calendar months represented in the series
    pub fn distinct_months(&self) -> usize {
        let mut months: Vec<u32> = self.points.iter().map(|p| p.date.month()).collect();
        months.sort_unstable();
        months.dedup();
        months.len()
    }
}

/// Severity of a detected pricing anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    None,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::None
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One detection method's contribution to an anomaly verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySignal {
    /// Detection method that produced this signal
    pub method: String,
    /// Method confidence in [0, 1]
    pub confidence: f64,
    /// Weight the aggregator applied to this method
    pub weight: f64,
    /// Human-readable detail for logs and review queues
    pub detail: String,
}

/// Per-offer anomaly verdict, derived fresh on every call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// Offer the verdict applies to
    pub offer_id: String,
    /// Whether aggregate confidence cleared the anomaly threshold
    pub is_anomaly: bool,
    /// Aggregate confidence in [0, 1]
    pub confidence: f64,
    /// Joint confidence/savings severity
    pub severity: Severity,
    /// Signals that contributed to the verdict
    pub signals: Vec<AnomalySignal>,
    /// Best available estimate of what the offer should cost
    pub estimated_market_value: f64,
    /// Estimated market value minus quoted price, clamped to >= 0
    pub potential_savings: f64,
}

/// Direction of a fitted price trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "INCREASING"),
            TrendDirection::Decreasing => write!(f, "DECREASING"),
            TrendDirection::Stable => write!(f, "STABLE"),
        }
    }
}

/// Strength of a fitted price trend, bucketed on R-squared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendStrength::Strong => write!(f, "STRONG"),
            TrendStrength::Moderate => write!(f, "MODERATE"),
            TrendStrength::Weak => write!(f, "WEAK"),
        }
    }
}

/// Timing recommendation synthesized from the forecast models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendedAction {
    BookNow,
    Wait,
    Monitor,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendedAction::BookNow => write!(f, "BOOK_NOW"),
            RecommendedAction::Wait => write!(f, "WAIT"),
            RecommendedAction::Monitor => write!(f, "MONITOR"),
        }
    }
}

/// Lower/upper bound of a forecast confidence band for one horizon day
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBand {
    pub lower: f64,
    pub upper: f64,
}

/// Percentile summary of a simulated price distribution
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub p10: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p90: f64,
    pub mean: f64,
}

/// Random-walk Monte Carlo output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    /// Number of simulated paths
    pub paths: usize,
    /// Simulation horizon in days
    pub horizon_days: u32,
    /// Distribution of prices at the end of the horizon
    pub terminal: DistributionSummary,
    /// Distribution of each path's minimum price
    pub path_minimum: DistributionSummary,
    /// Fraction of paths that ended above the current price
    pub probability_of_increase: f64,
    /// Fraction of paths that ended below the current price
    pub probability_of_decrease: f64,
    /// Current price minus mean terminal price (positive = waiting pays)
    pub expected_savings_if_wait: f64,
    /// p90 terminal minus current price
    pub worst_case_if_wait: f64,
    /// Current price minus p10 terminal
    pub best_case_if_wait: f64,
}

/// Mean-reversion model output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionSummary {
    /// Long-run mean the price reverts toward
    pub long_run_mean: f64,
    /// Reversion speed per day (0 = no detectable reversion)
    pub reversion_speed: f64,
    /// Volatility of daily price changes
    pub volatility: f64,
    /// Horizon day with the lowest expected price (1-based)
    pub optimal_booking_day: u32,
    /// Expected price on the optimal booking day
    pub optimal_booking_price: f64,
}

/// Full forecast for one property, derived fresh on every call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Forecast horizon in days
    pub horizon_days: u32,
    /// Expected price per horizon day (1-based, `point_forecast[0]` = day 1)
    pub point_forecast: Vec<f64>,
    /// ~90% confidence band per horizon day
    pub confidence_band: Vec<PriceBand>,
    /// Timing recommendation
    pub recommended_action: RecommendedAction,
    /// Probability the price falls over the horizon
    pub probability_price_falls: f64,
    /// Probability the price rises over the horizon
    pub probability_price_rises: f64,
    /// Plausible extra cost of waiting (p90 terminal premium), >= 0
    pub value_at_risk: f64,
    /// Expected extra cost of waiting (mean terminal premium), >= 0
    pub expected_regret_if_wait: f64,
    /// Expected saving from waiting (may be negative when prices drift up)
    pub expected_savings_if_wait: f64,
    /// Horizon day with the lowest expected price (1-based)
    pub optimal_booking_day: u32,
    /// Random-walk Monte Carlo details
    pub monte_carlo: MonteCarloSummary,
    /// Mean-reversion model details
    pub mean_reversion: MeanReversionSummary,
}

/// The six ranking dimensions, raw or normalized depending on context
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscores {
    /// Pricing-anomaly score
    pub anomaly: f64,
    /// Provenance exclusivity score
    pub exclusivity: f64,
    /// Value relative to the property's own price history
    pub historical_value: f64,
    /// Quality for the money
    pub quality_value: f64,
    /// Cancellation flexibility (deadline proximity)
    pub cancellation_flexibility: f64,
    /// Scarcity urgency
    pub availability_urgency: f64,
}

impl Subscores {
    /// Dimension names, in the same order as [`Subscores::as_array`]
    pub const DIMENSIONS: [&'static str; 6] = [
        "anomaly",
        "exclusivity",
        "historical_value",
        "quality_value",
        "cancellation_flexibility",
        "availability_urgency",
    ];

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.anomaly,
            self.exclusivity,
            self.historical_value,
            self.quality_value,
            self.cancellation_flexibility,
            self.availability_urgency,
        ]
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        Self {
            anomaly: values[0],
            exclusivity: values[1],
            historical_value: values[2],
            quality_value: values[3],
            cancellation_flexibility: values[4],
            availability_urgency: values[5],
        }
    }

    /// False when any dimension is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

/// Quality tier assigned from the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Exceptional,
    Great,
    Good,
    Fair,
    Poor,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Exceptional => write!(f, "EXCEPTIONAL"),
            Tier::Great => write!(f, "GREAT"),
            Tier::Good => write!(f, "GOOD"),
            Tier::Fair => write!(f, "FAIR"),
            Tier::Poor => write!(f, "POOR"),
        }
    }
}

/// An offer plus the scores and rank the engine assigned to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedOffer {
    pub offer: PricedOffer,
    /// Raw subscores as supplied to the ranker
    pub raw: Subscores,
    /// Min-max normalized subscores in [0, 100]
    pub normalized: Subscores,
    /// Weighted composite in [0, 100]
    pub composite_score: f64,
    /// Dense rank, 1 = best
    pub rank: u32,
    pub tier: Tier,
}
