//! Shared numeric helpers
//!
//! Every formula more than one component needs lives here, along with the
//! guards for short samples and zero variance, so no call site divides by
//! zero on its own.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by n). Returns 0.0 for fewer than
/// two points.
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}

/// Sample standard deviation (divides by n-1). Returns 0.0 for fewer than
/// two points.
pub fn sample_std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    var.sqrt()
}

/// Nearest-rank percentile of a sorted slice: index = ceil(q * n) - 1.
/// Deterministic, no interpolation. Returns 0.0 for an empty slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len() as f64;
    let rank = (q * n).ceil().max(1.0) as usize;
    sorted[rank.min(sorted.len()) - 1]
}

/// Nearest-rank first and third quartiles of a sorted slice
pub fn quartiles_sorted(sorted: &[f64]) -> (f64, f64) {
    (
        percentile_sorted(sorted, 0.25),
        percentile_sorted(sorted, 0.75),
    )
}

/// Ordinary least squares fit of y against its own index 0..n
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit y = intercept + slope * index. Returns `None` for fewer than two
/// points. A flat series yields slope 0 and r_squared 0.
pub fn ols_by_index(values: &[f64]) -> Option<OlsFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        return None;
    }

    let slope = num / den;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, &y)| (y - (intercept + slope * i as f64)).powi(2))
        .sum();
    let r_squared = if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Some(OlsFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Consecutive percent changes of a price series. Entries with a zero
/// previous price are skipped rather than produced as infinities.
pub fn percent_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&data) - 5.0).abs() < 1e-12);
        assert!((population_std_dev(&data) - 2.0).abs() < 1e-12);
        assert!(sample_std_dev(&data) > population_std_dev(&data));
    }

    #[test]
    fn test_std_short_sample_is_zero() {
        assert_eq!(population_std_dev(&[5.0]), 0.0);
        assert_eq!(sample_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_nearest_rank_percentile() {
        let sorted = [208.5, 215.0, 219.99, 229.0, 235.0];
        // ceil(0.25 * 5) = 2 -> second value
        assert_eq!(percentile_sorted(&sorted, 0.25), 215.0);
        // ceil(0.75 * 5) = 4 -> fourth value
        assert_eq!(percentile_sorted(&sorted, 0.75), 229.0);
        assert_eq!(percentile_sorted(&sorted, 0.5), 219.99);
        assert_eq!(percentile_sorted(&sorted, 1.0), 235.0);
    }

    #[test]
    fn test_ols_known_line() {
        // y = 3 + 2x, perfect fit
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let fit = ols_by_index(&values).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 3.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ols_flat_series() {
        let values = [200.0; 10];
        let fit = ols_by_index(&values).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn test_percent_returns_skip_zero_base() {
        let returns = percent_returns(&[100.0, 110.0, 0.0, 50.0]);
        // 0.0 -> 50.0 step is skipped
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.1).abs() < 1e-12);
    }
}
