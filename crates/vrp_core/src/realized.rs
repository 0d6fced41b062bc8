//! Realised volatility estimation.
//!
//! ## Conventions
//!
//! - `PercentOfPrice`: log returns `ln(p_t / p_{t-1})`, annualised and
//!   reported in percent: `σ = stdev(r) * sqrt(252) * 100`
//! - `BasisPointsOfYield`: first differences `y_t - y_{t-1}` of a yield
//!   quoted in percent, scaled to basis points: `σ = stdev(Δy * 100) * sqrt(252)`
//!
//! The standard deviation is the sample estimator (n − 1 denominator).
//!
//! A change is only formed between two adjacent observations that are both
//! valid, so a NaN price removes the changes on either side of it. Under the
//! log-return convention a non-positive price is treated as invalid.

use crate::types::{
    MissingReason, PriceSeries, VolatilityConvention, VolatilityReading, VolatilitySeries,
};
use chrono::NaiveDate;

/// Trading periods per year used for annualisation.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Conventional one-month realised volatility window.
pub const DEFAULT_RV_WINDOW: usize = 21;

/// Smallest window for which a sample standard deviation exists.
const MIN_WINDOW: usize = 2;

/// Dated period-over-period changes under `convention`, in output units
/// before annualisation.
///
/// Log returns are multiplied by 100 (percent), yield differences by 100
/// (percent of yield to basis points).
pub fn period_changes(
    series: &PriceSeries,
    convention: VolatilityConvention,
) -> Vec<(NaiveDate, f64)> {
    series
        .points()
        .windows(2)
        .filter_map(|pair| {
            let (_, prev) = pair[0];
            let (date, curr) = pair[1];
            change(prev, curr, convention).map(|c| (date, c))
        })
        .collect()
}

fn change(prev: f64, curr: f64, convention: VolatilityConvention) -> Option<f64> {
    if !prev.is_finite() || !curr.is_finite() {
        return None;
    }
    let raw = match convention {
        VolatilityConvention::PercentOfPrice => {
            if prev <= 0.0 || curr <= 0.0 {
                return None;
            }
            (curr / prev).ln()
        }
        VolatilityConvention::BasisPointsOfYield => curr - prev,
    };
    Some(raw * 100.0)
}

/// Sample standard deviation (n − 1 denominator).
///
/// Returns `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Annualised realised volatility over the trailing `window` changes.
///
/// # Returns
///
/// * `Value` in the convention's unit, dated at the last change
/// * `Missing(InsufficientData)` if fewer than `window` valid changes exist,
///   i.e. fewer than `window + 1` usable observations, or if `window < 2`
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use vrp_core::realized::compute_rv;
/// use vrp_core::types::{PriceSeries, VolatilityConvention};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let prices: Vec<f64> = (0..30).map(|i| 100.0 * (1.0 + 0.01 * (i % 2) as f64)).collect();
/// let series = PriceSeries::from_values(start, &prices).unwrap();
///
/// let rv = compute_rv(&series, 21, VolatilityConvention::PercentOfPrice);
/// assert!(rv.value().unwrap() > 0.0);
/// ```
pub fn compute_rv(
    series: &PriceSeries,
    window: usize,
    convention: VolatilityConvention,
) -> VolatilityReading {
    let changes = period_changes(series, convention);
    let need = window.max(MIN_WINDOW);
    if window < MIN_WINDOW || changes.len() < need {
        return VolatilityReading::missing(MissingReason::InsufficientData {
            got: changes.len(),
            need,
        });
    }

    let tail = &changes[changes.len() - window..];
    let values: Vec<f64> = tail.iter().map(|(_, c)| *c).collect();
    let as_of = tail.last().map(|(d, _)| *d);
    match sample_std_dev(&values) {
        Some(sd) => VolatilityReading::present(annualise(sd), convention.unit(), as_of),
        None => VolatilityReading::missing(MissingReason::InsufficientData {
            got: values.len(),
            need,
        }),
    }
}

/// Daily realised volatility series over a rolling `window`.
///
/// One point per change date that has a full trailing window. Empty when the
/// history is shorter than the window.
pub fn rolling_rv(
    series: &PriceSeries,
    window: usize,
    convention: VolatilityConvention,
) -> VolatilitySeries {
    let mut out = VolatilitySeries::new(convention.unit());
    if window < MIN_WINDOW {
        return out;
    }
    let changes = period_changes(series, convention);
    for end in window..=changes.len() {
        let slice = &changes[end - window..end];
        let values: Vec<f64> = slice.iter().map(|(_, c)| *c).collect();
        if let Some(sd) = sample_std_dev(&values) {
            out.push(slice[window - 1].0, annualise(sd));
        }
    }
    out
}

fn annualise(period_sd: f64) -> f64 {
    period_sd * TRADING_DAYS_PER_YEAR.sqrt()
}
