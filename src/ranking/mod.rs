//! Composite ranking of competing offers
//!
//! Normalizes heterogeneous per-offer subscores to a common [0, 100]
//! scale across the candidate set, combines them with configurable policy
//! weights, and assigns dense ranks and quality tiers. A candidate whose
//! subscores are unusable is excluded with a logged reason; the rest of
//! the batch still ranks.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::anomaly::detect_anomaly;
use crate::config::{AnomalyConfig, RankingConfig};
use crate::error::{EngineError, Result};
use crate::forecast::trend;
use crate::stats;
use crate::types::{
    PriceHistory, PriceSample, PricedOffer, RankedOffer, SourceTag, Subscores, Tier,
    TrendDirection,
};

/// Neutral normalized score for a dimension with no spread
const NEUTRAL_SCORE: f64 = 50.0;

/// An offer with its raw subscores, ready to rank
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub offer: PricedOffer,
    pub subscores: Subscores,
}

/// Rank a candidate set by weighted composite score.
///
/// Subscores are min-max normalized per dimension across the set; a
/// dimension with no spread contributes the neutral 50 for everyone, so
/// absent signal cannot manufacture separation. The sort is stable: equal
/// composites keep their input order.
pub fn rank(candidates: &[ScoredCandidate], config: &RankingConfig) -> Result<Vec<RankedOffer>> {
    if candidates.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let weight_sum = config.weights.sum();
    if (weight_sum - 1.0).abs() > 1e-6 {
        return Err(EngineError::InvalidParameter(format!(
            "ranking weights must sum to 1.0, got {weight_sum}"
        )));
    }

    // Exclude unusable candidates, keeping the reason visible
    let usable: Vec<&ScoredCandidate> = candidates
        .iter()
        .filter(|c| {
            if c.subscores.is_finite() {
                true
            } else {
                warn!(
                    offer_id = %c.offer.id,
                    "excluding offer from ranking: non-finite subscores"
                );
                false
            }
        })
        .collect();

    if usable.is_empty() {
        return Ok(Vec::new());
    }

    // Per-dimension min/max across the usable set
    let mut mins = [f64::INFINITY; 6];
    let mut maxs = [f64::NEG_INFINITY; 6];
    for candidate in &usable {
        for (i, value) in candidate.subscores.as_array().into_iter().enumerate() {
            mins[i] = mins[i].min(value);
            maxs[i] = maxs[i].max(value);
        }
    }

    let weights = [
        config.weights.anomaly,
        config.weights.exclusivity,
        config.weights.historical_value,
        config.weights.quality_value,
        config.weights.cancellation_flexibility,
        config.weights.availability_urgency,
    ];

    let mut ranked: Vec<RankedOffer> = usable
        .iter()
        .map(|candidate| {
            let raw = candidate.subscores.as_array();
            let mut normalized = [0.0f64; 6];
            let mut composite = 0.0;
            for i in 0..6 {
                normalized[i] = if maxs[i] == mins[i] {
                    NEUTRAL_SCORE
                } else {
                    (raw[i] - mins[i]) / (maxs[i] - mins[i]) * 100.0
                };
                composite += normalized[i] * weights[i];
            }
            RankedOffer {
                offer: candidate.offer.clone(),
                raw: candidate.subscores,
                normalized: Subscores::from_array(normalized),
                composite_score: composite,
                rank: 0,
                tier: tier_for(composite),
            }
        })
        .collect();

    // Stable sort keeps input order on equal composites
    ranked.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .expect("composite scores are finite")
    });

    // Dense ranks: equal composites share a rank, the next distinct
    // composite takes rank + 1
    let mut current_rank = 0u32;
    let mut previous_score = f64::NAN;
    for offer in ranked.iter_mut() {
        if offer.composite_score != previous_score {
            current_rank += 1;
            previous_score = offer.composite_score;
        }
        offer.rank = current_rank;
    }

    Ok(ranked)
}

fn tier_for(composite: f64) -> Tier {
    if composite >= 90.0 {
        Tier::Exceptional
    } else if composite >= 75.0 {
        Tier::Great
    } else if composite >= 60.0 {
        Tier::Good
    } else if composite >= 50.0 {
        Tier::Fair
    } else {
        Tier::Poor
    }
}

/// Build raw subscores for a batch of offers from the other engine
/// components. Offers are scored independently and in parallel; shared
/// inputs are read-only.
pub fn score_candidates(
    offers: &[PricedOffer],
    comparison: Option<&PriceSample>,
    histories: &HashMap<String, PriceHistory>,
    as_of: NaiveDate,
    anomaly_config: &AnomalyConfig,
) -> Vec<ScoredCandidate> {
    offers
        .par_iter()
        .map(|offer| {
            let history = histories.get(&offer.id);
            let verdict = detect_anomaly(offer, comparison, history, anomaly_config);

            ScoredCandidate {
                subscores: Subscores {
                    anomaly: verdict.confidence * 100.0,
                    exclusivity: exclusivity_score(offer.source),
                    historical_value: historical_value_score(offer, history),
                    quality_value: quality_value_score(offer),
                    cancellation_flexibility: cancellation_score(offer, as_of),
                    availability_urgency: availability_score(offer),
                },
                offer: offer.clone(),
            }
        })
        .collect()
}

fn exclusivity_score(source: SourceTag) -> f64 {
    match source {
        SourceTag::Exclusive => 100.0,
        SourceTag::Member => 75.0,
        SourceTag::Partner => 40.0,
        SourceTag::Public => 10.0,
    }
}

/// How good the quote looks against the property's own history: percent
/// below the historical mean (saturating at 50% below), nudged by the
/// fitted trend direction. No usable history scores neutral.
fn historical_value_score(offer: &PricedOffer, history: Option<&PriceHistory>) -> f64 {
    let Some(history) = history.filter(|h| h.len() >= PriceHistory::MIN_FORECAST_POINTS) else {
        return NEUTRAL_SCORE;
    };

    let hist_mean = stats::mean(&history.prices());
    if hist_mean <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let pct_below = (hist_mean - offer.quoted_price) / hist_mean;
    let base = pct_below.clamp(0.0, 0.5) / 0.5 * 100.0;

    // Rising prices make today's quote more attractive, falling ones less
    let adjustment = match trend::estimate_trend(history) {
        Ok(analysis) => match analysis.direction {
            TrendDirection::Increasing => 10.0,
            TrendDirection::Decreasing => -10.0,
            TrendDirection::Stable => 0.0,
        },
        Err(err) => {
            debug!(offer_id = %offer.id, %err, "trend unavailable for historical value score");
            0.0
        }
    };

    (base + adjustment).clamp(0.0, 100.0)
}

/// Quality for the money from the offer's own attributes
fn quality_value_score(offer: &PricedOffer) -> f64 {
    let rating_part = offer
        .quality
        .rating
        .map(|r| (r / 5.0).clamp(0.0, 1.0) * 70.0)
        .unwrap_or(35.0);
    let review_part = offer
        .quality
        .review_count
        .map(|c| (c as f64 / 500.0).min(1.0) * 15.0)
        .unwrap_or(0.0);
    let amenity_part = offer
        .quality
        .amenity_count
        .map(|c| (c as f64 / 10.0).min(1.0) * 15.0)
        .unwrap_or(0.0);
    rating_part + review_part + amenity_part
}

/// More days until the cancellation deadline means more flexibility;
/// saturates at 30 days out. No deadline means no free cancellation.
fn cancellation_score(offer: &PricedOffer, as_of: NaiveDate) -> f64 {
    match offer.cancellation_deadline {
        Some(deadline) => {
            let days = (deadline - as_of).num_days();
            if days <= 0 {
                0.0
            } else {
                (days.min(30) as f64 / 30.0) * 100.0
            }
        }
        None => 0.0,
    }
}

/// Scarcer availability scores as more urgent; unreported scores neutral
fn availability_score(offer: &PricedOffer) -> f64 {
    match offer.availability_count {
        Some(count) => (1.0 - (count.min(20) as f64 / 20.0)) * 100.0,
        None => NEUTRAL_SCORE,
    }
}
