//! Dated price series.

use super::error::SeriesError;
use chrono::{Duration, NaiveDate};

/// An ordered sequence of `(date, price)` observations.
///
/// Dates are strictly increasing with no duplicates; gaps for non-trading
/// days are allowed. Prices may be NaN where the upstream partially failed,
/// consumers are expected to skip them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    /// Build a series from points already in date order.
    ///
    /// # Errors
    ///
    /// * `SeriesError::DuplicateDate` - If two points share a date
    /// * `SeriesError::Unordered` - If a point precedes its predecessor
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self, SeriesError> {
        for pair in points.windows(2) {
            let (previous, date) = (pair[0].0, pair[1].0);
            if date == previous {
                return Err(SeriesError::DuplicateDate { date });
            }
            if date < previous {
                return Err(SeriesError::Unordered { previous, date });
            }
        }
        Ok(Self { points })
    }

    /// Build a series from provider rows in any order.
    ///
    /// Rows are sorted by date; for a repeated date the last row wins.
    pub fn from_unsorted(mut points: Vec<(NaiveDate, f64)>) -> Self {
        // Stable sort keeps provider order within a date, so the last row stays last.
        points.sort_by_key(|(date, _)| *date);
        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.0 == point.0 => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    /// Build a series of consecutive calendar days starting at `start`.
    pub fn from_values(start: NaiveDate, values: &[f64]) -> Result<Self, SeriesError> {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v))
            .collect();
        Self::new(points)
    }

    /// Number of points, NaN included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in date order.
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// Dates in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|(d, _)| *d)
    }

    /// Values in date order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    /// Number of finite observations.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_finite()).count()
    }

    /// Whether every value is NaN or infinite.
    pub fn is_all_missing(&self) -> bool {
        self.valid_count() == 0
    }

    /// Latest finite observation.
    pub fn last_valid(&self) -> Option<(NaiveDate, f64)> {
        self.points.iter().rev().find(|(_, v)| v.is_finite()).copied()
    }

    /// Date of the final point, valid or not.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = PriceSeries::new(vec![(d(1), 1.0), (d(1), 2.0)]);
        assert_eq!(result, Err(SeriesError::DuplicateDate { date: d(1) }));
    }

    #[test]
    fn test_new_rejects_unordered() {
        let result = PriceSeries::new(vec![(d(2), 1.0), (d(1), 2.0)]);
        assert!(matches!(result, Err(SeriesError::Unordered { .. })));
    }

    #[test]
    fn test_from_unsorted_last_row_wins() {
        let series = PriceSeries::from_unsorted(vec![(d(3), 3.0), (d(1), 1.0), (d(3), 4.0)]);
        assert_eq!(series.points(), &[(d(1), 1.0), (d(3), 4.0)]);
    }

    #[test]
    fn test_last_valid_skips_nan() {
        let series = PriceSeries::new(vec![(d(1), 1.0), (d(2), 2.0), (d(3), f64::NAN)]).unwrap();
        assert_eq!(series.last_valid(), Some((d(2), 2.0)));
        assert_eq!(series.last_date(), Some(d(3)));
        assert_eq!(series.valid_count(), 2);
    }

    #[test]
    fn test_all_missing() {
        let series = PriceSeries::from_values(d(1), &[f64::NAN, f64::NAN]).unwrap();
        assert!(series.is_all_missing());
        assert!(series.last_valid().is_none());
        assert!(!series.is_empty());
    }
}
