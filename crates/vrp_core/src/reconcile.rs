//! IV/RV reconciliation.
//!
//! The VRP is implied minus realised volatility in a shared unit. Missing
//! inputs propagate: there is no partial computation and no default value.

use crate::types::{VolatilityReading, VolatilitySeries, VrpError, VrpPoint};

/// Compute `iv - rv`.
///
/// # Returns
///
/// * `Ok(Missing)` - If either reading is missing; the implied side's reason
///   is kept when both are
/// * `Ok(Value)` - The difference, in the shared unit, dated at the later of
///   the two observation dates
/// * `Err(VrpError::UnitMismatch)` - If both are present in different units
pub fn reconcile(
    iv: &VolatilityReading,
    rv: &VolatilityReading,
) -> Result<VolatilityReading, VrpError> {
    match (iv, rv) {
        (VolatilityReading::Missing { reason }, _) | (_, VolatilityReading::Missing { reason }) => {
            Ok(VolatilityReading::missing(reason.clone()))
        }
        (
            VolatilityReading::Value {
                value: implied,
                unit: iv_unit,
                as_of: iv_date,
            },
            VolatilityReading::Value {
                value: realized,
                unit: rv_unit,
                as_of: rv_date,
            },
        ) => {
            if iv_unit != rv_unit {
                return Err(VrpError::UnitMismatch {
                    implied: *iv_unit,
                    realized: *rv_unit,
                });
            }
            let as_of = match (iv_date, rv_date) {
                (Some(a), Some(b)) => Some((*a).max(*b)),
                (a, b) => (*a).or(*b),
            };
            Ok(VolatilityReading::present(implied - realized, *iv_unit, as_of))
        }
    }
}

/// VRP over time.
///
/// The implied series, usually far sparser than the daily realised series,
/// is forward-filled onto the realised dates: the latest implied observation
/// on or before each date is treated as current. Dates before the first
/// implied observation have no VRP.
///
/// # Errors
///
/// * `VrpError::UnitMismatch` - If the two series are in different units
pub fn reconcile_series(
    iv: &VolatilitySeries,
    rv: &VolatilitySeries,
) -> Result<Vec<VrpPoint>, VrpError> {
    if iv.unit != rv.unit {
        return Err(VrpError::UnitMismatch {
            implied: iv.unit,
            realized: rv.unit,
        });
    }

    let mut implied_points = iv.points.iter().peekable();
    let mut current: Option<f64> = None;
    let mut out = Vec::with_capacity(rv.points.len());

    for &(date, realized) in &rv.points {
        while let Some(&&(iv_date, value)) = implied_points.peek() {
            if iv_date > date {
                break;
            }
            if value.is_finite() {
                current = Some(value);
            }
            implied_points.next();
        }
        out.push(VrpPoint {
            date,
            implied: current,
            realized,
            vrp: current.map(|implied| implied - realized),
        });
    }

    Ok(out)
}
