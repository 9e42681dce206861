//! Rule-based detection of data-entry error signatures
//!
//! Stateless per-offer checks that need no comparison sample: decimal
//! shifts, currency mixups, missing digits, and suspicious round numbers
//! on high-quality inventory. Each matched rule adds an independent
//! confidence increment; the total is capped at 1.0.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::PricedOffer;

/// Relative tolerance for "approximately equal" price comparisons
const REL_TOLERANCE: f64 = 0.02;

/// Rating at and above which an offer counts as high-quality
const HIGH_QUALITY_RATING: f64 = 4.5;

const DECIMAL_SHIFT_CONFIDENCE: f64 = 0.45;
const CURRENCY_MIXUP_CONFIDENCE: f64 = 0.40;
const MISSING_DIGIT_CONFIDENCE: f64 = 0.30;
const ROUND_NUMBER_CONFIDENCE: f64 = 0.20;

/// A recognized data-entry error signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricePattern {
    /// Quoted price is the listed original shifted one decimal place down
    DecimalShift,
    /// Quoted price matches the original under a plausible currency-rate slip
    CurrencyMixup,
    /// Quoted price sits below the floor plausible for its quality class
    MissingDigit,
    /// Suspiciously round price on a high-quality item
    RoundNumberHighQuality,
}

impl fmt::Display for PricePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricePattern::DecimalShift => write!(f, "DECIMAL_SHIFT"),
            PricePattern::CurrencyMixup => write!(f, "CURRENCY_MIXUP"),
            PricePattern::MissingDigit => write!(f, "MISSING_DIGIT"),
            PricePattern::RoundNumberHighQuality => write!(f, "ROUND_NUMBER_HIGH_QUALITY"),
        }
    }
}

/// Matched patterns plus their aggregate confidence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternReport {
    pub patterns: Vec<PricePattern>,
    /// Sum of per-pattern increments, capped at 1.0
    pub confidence: f64,
}

impl PatternReport {
    pub fn matched(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Pattern names joined for log lines and verdict details
    pub fn names(&self) -> String {
        self.patterns
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    if b == 0.0 {
        return false;
    }
    ((a - b) / b).abs() <= REL_TOLERANCE
}

/// Price floor below which a quote is implausible for the quality class
fn quality_class_floor(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r >= HIGH_QUALITY_RATING => 150.0,
        Some(r) if r >= 4.0 => 100.0,
        Some(r) if r >= 3.0 => 50.0,
        _ => 25.0,
    }
}

fn is_round_price(price: f64) -> bool {
    price > 0.0 && price.fract() == 0.0 && (price as u64) % 50 == 0
}

/// Run all pattern rules against one offer
pub fn match_patterns(offer: &PricedOffer) -> PatternReport {
    let price = offer.quoted_price;
    let mut report = PatternReport::default();

    if let Some(original) = offer.listed_original_price.filter(|&o| o > 0.0) {
        if approx_eq(price, original / 10.0) {
            report.patterns.push(PricePattern::DecimalShift);
            report.confidence += DECIMAL_SHIFT_CONFIDENCE;
        } else {
            // Decimal shift already covers price = original / 10; the mixup
            // rule catches the remaining rate-slip multiples.
            let mixup = [0.01, 0.1, 100.0]
                .iter()
                .any(|&k| approx_eq(price * k, original));
            if mixup {
                report.patterns.push(PricePattern::CurrencyMixup);
                report.confidence += CURRENCY_MIXUP_CONFIDENCE;
            }
        }
    }

    if price > 0.0 && price < quality_class_floor(offer.quality.rating) {
        report.patterns.push(PricePattern::MissingDigit);
        report.confidence += MISSING_DIGIT_CONFIDENCE;
    }

    if offer.quality.rating.is_some_and(|r| r >= HIGH_QUALITY_RATING) && is_round_price(price) {
        report.patterns.push(PricePattern::RoundNumberHighQuality);
        report.confidence += ROUND_NUMBER_CONFIDENCE;
    }

    report.confidence = report.confidence.min(1.0);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QualityAttributes, SourceTag};

    fn offer(price: f64, original: Option<f64>, rating: Option<f64>) -> PricedOffer {
        PricedOffer {
            id: "test".to_string(),
            quoted_price: price,
            listed_original_price: original,
            quality: QualityAttributes {
                rating,
                review_count: Some(120),
                amenity_count: Some(8),
            },
            cancellation_deadline: None,
            availability_count: None,
            source: SourceTag::Public,
        }
    }

    #[test]
    fn test_decimal_shift() {
        let report = match_patterns(&offer(45.0, Some(450.0), Some(4.0)));
        assert!(report.patterns.contains(&PricePattern::DecimalShift));
        // A 45.00 quote for a 4.0-rated item is also below the class floor
        assert!(report.patterns.contains(&PricePattern::MissingDigit));
        assert!((report.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_currency_mixup_hundredfold() {
        // 2.20 quoted against a 220.00 original: price * 100 matches
        let report = match_patterns(&offer(2.20, Some(220.0), None));
        assert!(report.patterns.contains(&PricePattern::CurrencyMixup));
    }

    #[test]
    fn test_round_number_on_high_quality() {
        let report = match_patterns(&offer(200.0, None, Some(4.8)));
        assert_eq!(report.patterns, vec![PricePattern::RoundNumberHighQuality]);
        assert!((report.confidence - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_round_number_ignored_on_average_quality() {
        let report = match_patterns(&offer(200.0, None, Some(3.9)));
        assert!(!report.matched());
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_missing_digit_floor_scales_with_rating() {
        // 120.00 is fine for a 3.5-rated item but implausible at 4.9
        assert!(!match_patterns(&offer(120.0, None, Some(3.5))).matched());
        let report = match_patterns(&offer(120.0, None, Some(4.9)));
        assert_eq!(report.patterns, vec![PricePattern::MissingDigit]);
    }

    #[test]
    fn test_clean_offer_matches_nothing() {
        let report = match_patterns(&offer(219.99, Some(260.0), Some(4.2)));
        assert!(!report.matched());
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_confidence_capped_at_one() {
        // Decimal shift + missing digit + round number on a premium item
        let report = match_patterns(&offer(50.0, Some(500.0), Some(4.9)));
        assert!(report.patterns.len() >= 3);
        assert!(report.confidence <= 1.0);
    }
}
