//! Anomaly detection - is a quoted price a pricing mistake?
//!
//! Combines statistical outlier checks, historical deviation, discount
//! ratio, and data-entry pattern matching into one weighted verdict per
//! offer.

pub mod outlier;
pub mod patterns;

use tracing::debug;

use crate::config::AnomalyConfig;
use crate::stats;
use crate::types::{
    AnomalySignal, AnomalyVerdict, PriceHistory, PriceSample, PricedOffer, Severity,
};

/// Aggregate confidence needed (on top of `is_anomaly`) before severity
/// can reach HIGH
const HIGH_CONFIDENCE: f64 = 0.88;
/// Aggregate confidence needed for CRITICAL
const CRITICAL_CONFIDENCE: f64 = 0.92;
/// Savings as a fraction of market value needed for CRITICAL
const CRITICAL_SAVINGS_RATIO: f64 = 0.40;

/// Judge whether an offer's quoted price is likely a pricing mistake.
///
/// Each detection method contributes `confidence * weight`. Methods whose
/// inputs are absent or too small are skipped; their weight is NOT
/// redistributed to the remaining methods, so the aggregate confidence is
/// systematically lower when fewer signals are available.
pub fn detect_anomaly(
    offer: &PricedOffer,
    comparison: Option<&PriceSample>,
    history: Option<&PriceHistory>,
    config: &AnomalyConfig,
) -> AnomalyVerdict {
    let price = offer.quoted_price;
    let weights = &config.weights;
    let mut signals = Vec::new();
    let mut confidence = 0.0;

    let sample = comparison.map(PriceSample::prices).unwrap_or(&[]);

    match outlier::z_score_check(price, sample, config.z_score_threshold) {
        Some(report) => {
            confidence += report.confidence * weights.z_score;
            signals.push(AnomalySignal {
                method: "z_score".to_string(),
                confidence: report.confidence,
                weight: weights.z_score,
                detail: report.detail,
            });
        }
        None => debug!(
            offer_id = %offer.id,
            sample_len = sample.len(),
            "comparison sample too small for z-score check"
        ),
    }

    match outlier::iqr_check(price, sample) {
        Some(report) => {
            confidence += report.confidence * weights.iqr;
            signals.push(AnomalySignal {
                method: "iqr".to_string(),
                confidence: report.confidence,
                weight: weights.iqr,
                detail: report.detail,
            });
        }
        None => debug!(
            offer_id = %offer.id,
            sample_len = sample.len(),
            "comparison sample too small for IQR check"
        ),
    }

    let history_mean = history
        .filter(|h| !h.is_empty())
        .map(|h| stats::mean(&h.prices()));

    match history.filter(|h| h.len() >= PriceHistory::MIN_HISTORICAL_ANOMALY_POINTS) {
        Some(h) => {
            let hist_mean = stats::mean(&h.prices());
            let method_confidence = deviation_confidence(price, hist_mean, config.deviation_floor);
            confidence += method_confidence * weights.historical;
            signals.push(AnomalySignal {
                method: "historical_deviation".to_string(),
                confidence: method_confidence,
                weight: weights.historical,
                detail: format!("price {price:.2} vs historical mean {hist_mean:.2}"),
            });
        }
        None => debug!(
            offer_id = %offer.id,
            history_len = history.map(PriceHistory::len).unwrap_or(0),
            "history too short for deviation scoring"
        ),
    }

    match offer.listed_original_price.filter(|&o| o > 0.0) {
        Some(original) => {
            let method_confidence = deviation_confidence(price, original, config.deviation_floor);
            confidence += method_confidence * weights.discount;
            signals.push(AnomalySignal {
                method: "discount_ratio".to_string(),
                confidence: method_confidence,
                weight: weights.discount,
                detail: format!("price {price:.2} vs listed original {original:.2}"),
            });
        }
        None => debug!(offer_id = %offer.id, "no listed original price for discount scoring"),
    }

    let pattern_report = patterns::match_patterns(offer);
    if pattern_report.matched() {
        confidence += pattern_report.confidence * weights.pattern;
        signals.push(AnomalySignal {
            method: "pattern".to_string(),
            confidence: pattern_report.confidence,
            weight: weights.pattern,
            detail: pattern_report.names(),
        });
    }

    let estimated_market_value = estimate_market_value(offer, comparison, history_mean);
    let potential_savings = (estimated_market_value - price).max(0.0);
    let is_anomaly = confidence >= config.anomaly_threshold;
    let severity = classify_severity(is_anomaly, confidence, potential_savings, estimated_market_value);

    AnomalyVerdict {
        offer_id: offer.id.clone(),
        is_anomaly,
        confidence,
        severity,
        signals,
        estimated_market_value,
        potential_savings,
    }
}

/// Confidence from how far `price` sits below `reference`, gated on the
/// configured floor: 0 below the floor, scaling to 1 at twice the floor.
fn deviation_confidence(price: f64, reference: f64, floor: f64) -> f64 {
    if reference <= 0.0 || floor <= 0.0 {
        return 0.0;
    }
    let pct_below = (reference - price) / reference;
    if pct_below < floor {
        return 0.0;
    }
    (pct_below / (2.0 * floor)).min(1.0)
}

/// Best available market-value estimate: comparison mean, then historical
/// mean, then listed original, then the quote itself.
fn estimate_market_value(
    offer: &PricedOffer,
    comparison: Option<&PriceSample>,
    history_mean: Option<f64>,
) -> f64 {
    if let Some(sample) = comparison.filter(|s| !s.is_empty()) {
        return stats::mean(sample.prices());
    }
    if let Some(mean) = history_mean {
        return mean;
    }
    offer.listed_original_price.unwrap_or(offer.quoted_price)
}

/// Severity is joint: CRITICAL needs both near-certain confidence and
/// savings worth a large share of the market value.
fn classify_severity(
    is_anomaly: bool,
    confidence: f64,
    potential_savings: f64,
    estimated_market_value: f64,
) -> Severity {
    if !is_anomaly {
        return Severity::None;
    }
    let savings_ratio = if estimated_market_value > 0.0 {
        potential_savings / estimated_market_value
    } else {
        0.0
    };
    if confidence >= CRITICAL_CONFIDENCE && savings_ratio >= CRITICAL_SAVINGS_RATIO {
        Severity::Critical
    } else if confidence >= HIGH_CONFIDENCE {
        Severity::High
    } else {
        Severity::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QualityAttributes, SourceTag};
    use chrono::NaiveDate;

    fn offer(price: f64, original: Option<f64>, rating: Option<f64>) -> PricedOffer {
        PricedOffer {
            id: "offer-1".to_string(),
            quoted_price: price,
            listed_original_price: original,
            quality: QualityAttributes {
                rating,
                review_count: Some(340),
                amenity_count: Some(12),
            },
            cancellation_deadline: None,
            availability_count: Some(3),
            source: SourceTag::Member,
        }
    }

    fn history_around(mean: f64, n: usize) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        PriceHistory::from_pairs((0..n).map(|i| {
            let wiggle = (i % 3) as f64 - 1.0;
            (start + chrono::Days::new(i as u64), mean + wiggle)
        }))
    }

    #[test]
    fn test_savings_computed_from_comparison_mean() {
        let comparison = PriceSample::new(vec![208.50, 215.0, 219.99, 229.0, 235.0]);
        let verdict = detect_anomaly(
            &offer(89.99, None, None),
            Some(&comparison),
            None,
            &AnomalyConfig::default(),
        );

        assert!((verdict.estimated_market_value - 221.498).abs() < 0.01);
        assert!((verdict.potential_savings - 131.51).abs() < 0.01);
        assert!(verdict.signals.iter().any(|s| s.method == "z_score"));
        assert!(verdict.signals.iter().any(|s| s.method == "iqr"));
    }

    #[test]
    fn test_weights_not_redistributed_when_methods_missing() {
        // Only z-score and IQR can fire: no history, no original price, no
        // pattern hit. Even at full method confidence the aggregate cannot
        // exceed the two weights combined.
        let comparison = PriceSample::new(vec![208.50, 215.0, 219.99, 229.0, 235.0]);
        let config = AnomalyConfig::default();
        let verdict = detect_anomaly(
            &offer(89.99, None, None),
            Some(&comparison),
            None,
            &config,
        );

        let ceiling = config.weights.z_score + config.weights.iqr;
        assert!(verdict.confidence <= ceiling + 1e-9);
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn test_all_signals_drive_anomaly() {
        // Deep underpricing visible to every method: comparison set,
        // 60%-below historical mean, 80% discount, decimal shift pattern.
        let comparison = PriceSample::new(vec![208.50, 215.0, 219.99, 229.0, 235.0]);
        let history = history_around(220.0, 15);
        let verdict = detect_anomaly(
            &offer(22.0, Some(220.0), Some(4.8)),
            Some(&comparison),
            Some(&history),
            &AnomalyConfig::default(),
        );

        assert!(verdict.is_anomaly);
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(verdict.signals.len(), 5);
    }

    #[test]
    fn test_fair_price_is_not_anomalous() {
        let comparison = PriceSample::new(vec![208.50, 215.0, 219.99, 229.0, 235.0]);
        let history = history_around(220.0, 15);
        let verdict = detect_anomaly(
            &offer(218.0, Some(260.0), Some(4.2)),
            Some(&comparison),
            Some(&history),
            &AnomalyConfig::default(),
        );

        assert!(!verdict.is_anomaly);
        assert_eq!(verdict.severity, Severity::None);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_savings_clamped_at_zero() {
        // Quote above every reference: raw delta is negative, report clamps
        let comparison = PriceSample::new(vec![100.0, 105.0, 110.0]);
        let verdict = detect_anomaly(
            &offer(180.0, None, None),
            Some(&comparison),
            None,
            &AnomalyConfig::default(),
        );

        assert_eq!(verdict.potential_savings, 0.0);
    }

    #[test]
    fn test_market_value_falls_back_to_history_then_original() {
        let history = history_around(300.0, 12);
        let with_history = detect_anomaly(
            &offer(100.0, Some(500.0), None),
            None,
            Some(&history),
            &AnomalyConfig::default(),
        );
        assert!((with_history.estimated_market_value - 300.0).abs() < 1.0);

        let original_only = detect_anomaly(
            &offer(100.0, Some(500.0), None),
            None,
            None,
            &AnomalyConfig::default(),
        );
        assert_eq!(original_only.estimated_market_value, 500.0);

        let bare = detect_anomaly(&offer(100.0, None, None), None, None, &AnomalyConfig::default());
        assert_eq!(bare.estimated_market_value, 100.0);
    }

    #[test]
    fn test_short_history_skips_deviation_method() {
        let history = history_around(300.0, 5);
        let verdict = detect_anomaly(
            &offer(100.0, None, None),
            None,
            Some(&history),
            &AnomalyConfig::default(),
        );

        assert!(!verdict
            .signals
            .iter()
            .any(|s| s.method == "historical_deviation"));
        // A short history still informs the market-value estimate
        assert!((verdict.estimated_market_value - 300.0).abs() < 1.0);
    }

    #[test]
    fn test_deviation_confidence_scaling() {
        // Below the floor: nothing
        assert_eq!(deviation_confidence(130.0, 200.0, 0.40), 0.0);
        // At the floor: half confidence
        assert!((deviation_confidence(120.0, 200.0, 0.40) - 0.5).abs() < 1e-9);
        // At twice the floor: saturated
        assert_eq!(deviation_confidence(40.0, 200.0, 0.40), 1.0);
    }
}
