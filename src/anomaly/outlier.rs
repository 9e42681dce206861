//! Statistical outlier checks over a comparison price sample
//!
//! Two methods: z-score against the sample mean and an IQR lower bound.
//! Both tolerate degenerate samples (zero variance, zero IQR) by reporting
//! not-an-outlier with confidence 0 instead of dividing by zero.

use serde::{Deserialize, Serialize};

use crate::stats;
use crate::types::Severity;

/// Minimum comparison prices for the z-score check
pub const MIN_Z_SCORE_SAMPLE: usize = 3;
/// Minimum comparison prices for the IQR check
pub const MIN_IQR_SAMPLE: usize = 5;

/// Confidence saturates at a z-score magnitude of 5
const Z_CONFIDENCE_SCALE: f64 = 5.0;

/// Outcome of one outlier check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierReport {
    pub is_outlier: bool,
    /// Confidence that the price is an underpricing outlier, in [0, 1]
    pub confidence: f64,
    pub severity: Severity,
    pub detail: String,
}

impl OutlierReport {
    fn negative(detail: impl Into<String>) -> Self {
        Self {
            is_outlier: false,
            confidence: 0.0,
            severity: Severity::None,
            detail: detail.into(),
        }
    }
}

/// Z-score check of `price` against a comparison sample.
///
/// The sample is the comparison set only; the candidate price must not be
/// part of it. Uses the population standard deviation. Flags prices more
/// than `threshold` standard deviations BELOW the mean (cheap side only).
///
/// Returns `None` when the sample is too small to support the check.
pub fn z_score_check(price: f64, sample: &[f64], threshold: f64) -> Option<OutlierReport> {
    if sample.len() < MIN_Z_SCORE_SAMPLE {
        return None;
    }

    let mean = stats::mean(sample);
    let std_dev = stats::population_std_dev(sample);
    if std_dev == 0.0 {
        return Some(OutlierReport::negative("zero-variance comparison sample"));
    }

    let z = (price - mean) / std_dev;
    if z >= -threshold {
        return Some(OutlierReport::negative(format!(
            "z={z:.2} within {threshold:.2} std devs of mean {mean:.2}"
        )));
    }

    let confidence = (z.abs() / Z_CONFIDENCE_SCALE).min(1.0);
    let severity = if z.abs() > 3.0 {
        Severity::Critical
    } else if z.abs() > 2.5 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(OutlierReport {
        is_outlier: true,
        confidence,
        severity,
        detail: format!("z={z:.2} below mean {mean:.2} (std dev {std_dev:.2})"),
    })
}

/// IQR lower-bound check of `price` against a comparison sample.
///
/// Quartiles are nearest-rank (deterministic, no interpolation); the lower
/// fence is `Q1 - 1.5 * IQR`. Confidence scales with how far below Q1 the
/// price sits, capped at 1.
///
/// Returns `None` when the sample is too small to support the check.
pub fn iqr_check(price: f64, sample: &[f64]) -> Option<OutlierReport> {
    if sample.len() < MIN_IQR_SAMPLE {
        return None;
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("comparison prices must not be NaN"));

    let (q1, q3) = stats::quartiles_sorted(&sorted);
    let iqr = q3 - q1;
    if iqr == 0.0 {
        return Some(OutlierReport::negative("zero-IQR comparison sample"));
    }

    let lower_bound = q1 - 1.5 * iqr;
    if price >= lower_bound {
        return Some(OutlierReport::negative(format!(
            "price {price:.2} above lower fence {lower_bound:.2}"
        )));
    }

    let confidence = if q1 > 0.0 {
        ((q1 - price) / q1).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let severity = if confidence >= 0.8 {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(OutlierReport {
        is_outlier: true,
        confidence,
        severity,
        detail: format!("price {price:.2} below lower fence {lower_bound:.2} (Q1 {q1:.2}, IQR {iqr:.2})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_score_flags_deep_underpricing() {
        let sample = [208.50, 215.0, 219.99, 229.0, 235.0];
        let report = z_score_check(89.99, &sample, 2.5).unwrap();

        assert!(report.is_outlier);
        assert_eq!(report.severity, Severity::Critical);
        // |z| is far past the saturation point, so confidence clamps to 1
        assert_eq!(report.confidence, 1.0);
    }

    #[test]
    fn test_z_score_ignores_expensive_side() {
        let sample = [100.0, 105.0, 110.0, 95.0, 90.0];
        let report = z_score_check(500.0, &sample, 2.5).unwrap();
        assert!(!report.is_outlier);
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_z_score_constant_sample() {
        let sample = [150.0, 150.0, 150.0, 150.0];
        let report = z_score_check(20.0, &sample, 2.5).unwrap();
        assert!(!report.is_outlier);
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_z_score_sample_too_small() {
        assert!(z_score_check(50.0, &[100.0, 110.0], 2.5).is_none());
    }

    #[test]
    fn test_z_score_injected_five_sigma_outlier() {
        // Sample with known spread; candidate planted at mean - 5 sigma
        let sample: Vec<f64> = (0..20).map(|i| 200.0 + (i % 5) as f64 * 4.0).collect();
        let mean = crate::stats::mean(&sample);
        let sd = crate::stats::population_std_dev(&sample);
        let report = z_score_check(mean - 5.0 * sd, &sample, 2.5).unwrap();

        assert!(report.is_outlier);
        assert!(report.confidence >= 0.9);
    }

    #[test]
    fn test_iqr_flags_underpricing() {
        let sample = [208.50, 215.0, 219.99, 229.0, 235.0];
        let report = iqr_check(89.99, &sample).unwrap();

        // Q1 = 215, Q3 = 229, fence = 215 - 21 = 194
        assert!(report.is_outlier);
        assert!((report.confidence - (215.0 - 89.99) / 215.0).abs() < 1e-9);
    }

    #[test]
    fn test_iqr_constant_sample() {
        let sample = [99.0; 6];
        let report = iqr_check(10.0, &sample).unwrap();
        assert!(!report.is_outlier);
        assert_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_iqr_sample_too_small() {
        assert!(iqr_check(50.0, &[100.0, 110.0, 120.0, 130.0]).is_none());
    }

    #[test]
    fn test_iqr_confidence_capped() {
        let sample = [1000.0, 1010.0, 1020.0, 1030.0, 1040.0];
        let report = iqr_check(-50.0, &sample).unwrap();
        assert!(report.is_outlier);
        assert_eq!(report.confidence, 1.0);
    }
}
