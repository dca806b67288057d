//! Statistics for Price Aggregation
//!
//! Pure, stateless numeric helpers. Every function has a defined fallback
//! for degenerate input (empty slices, zero variance) and never panics.

use super::types::QualifiedResponse;

/// Arithmetic mean. Returns 0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sorted median. Averages the two middle elements for even lengths.
/// Returns 0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation (divides by N) around the supplied center.
/// Returns 0 for empty input.
pub fn standard_deviation(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;

    variance.sqrt()
}

/// Distance from `center` in units of `std_dev`. Zero when there is no spread.
pub fn z_score(value: f64, center: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - center).abs() / std_dev
}

/// Outlier rule: strictly more than `limit` standard deviations from `center`.
/// Nothing is an outlier when there is no spread.
pub fn is_outlier(value: f64, center: f64, std_dev: f64, limit: f64) -> bool {
    std_dev > 0.0 && (value - center).abs() > limit * std_dev
}

/// Stake-weighted median price.
///
/// Scans responses in ascending price order and returns the first price whose
/// cumulative weight reaches half the total weight. A cumulative weight landing
/// exactly on the boundary therefore resolves to the lower price.
///
/// Returns 0 for an empty list or zero total weight. If floating point drift
/// keeps the scan from reaching the target, the highest price is returned.
pub fn weighted_median(responses: &[QualifiedResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }

    let total_weight: f64 = responses.iter().map(|r| r.weight).sum();
    if total_weight == 0.0 {
        return 0.0;
    }

    let mut sorted: Vec<&QualifiedResponse> = responses.iter().collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let target = total_weight / 2.0;
    let mut cumulative = 0.0;

    for response in &sorted {
        cumulative += response.weight;
        if cumulative >= target {
            return response.price;
        }
    }

    sorted[sorted.len() - 1].price
}
