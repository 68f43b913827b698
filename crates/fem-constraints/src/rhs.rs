//! Time-dependent right-hand sides of constraint equations.
//!
//! A constraint `Σ cᵢ·uᵢ = rhs(t)` is driven by a scalar function of the
//! pseudo-time `t`. The functions here are evaluated, never clamped: outside
//! the range a load history was specified on, the last linear segment is
//! continued.

use crate::error::{ConstraintError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared scalar function of the pseudo-time
pub type TimeFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Right-hand side of a constraint equation as a function of pseudo-time
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhsFunction {
    /// Time-independent value
    Constant(f64),
    /// Linear ramp through the origin reaching `value_end` at `time_end`
    Ramp { time_end: f64, value_end: f64 },
    /// Piecewise linear load history
    Table(LoadTable),
    /// Arbitrary user function
    #[serde(skip)]
    Custom(TimeFn),
}

impl RhsFunction {
    /// Homogeneous right-hand side
    pub fn zero() -> Self {
        Self::Constant(0.0)
    }

    pub fn ramp(time_end: f64, value_end: f64) -> Self {
        Self::Ramp {
            time_end,
            value_end,
        }
    }

    /// Piecewise linear history through `(time, value)` points, in any order
    pub fn table(points: Vec<(f64, f64)>) -> Result<Self> {
        Ok(Self::Table(LoadTable::new(points)?))
    }

    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Evaluate at pseudo-time `t`
    pub fn value(&self, t: f64) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Ramp {
                time_end,
                value_end,
            } => {
                if *time_end == 0.0 {
                    *value_end
                } else {
                    value_end * t / time_end
                }
            }
            Self::Table(table) => interpolate(table.points(), t),
            Self::Custom(f) => f(t),
        }
    }

    /// True if the value is zero for every `t`, as far as can be told without sampling
    pub fn is_homogeneous(&self) -> bool {
        match self {
            Self::Constant(value) => *value == 0.0,
            Self::Ramp { value_end, .. } => *value_end == 0.0,
            Self::Table(table) => table.points().iter().all(|&(_, v)| v == 0.0),
            Self::Custom(_) => false,
        }
    }
}

impl Default for RhsFunction {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for RhsFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Ramp {
                time_end,
                value_end,
            } => f
                .debug_struct("Ramp")
                .field("time_end", time_end)
                .field("value_end", value_end)
                .finish(),
            Self::Table(table) => f.debug_tuple("Table").field(&table.points).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// `(time, value)` points sorted by time.
///
/// Deserialization goes through [`LoadTable::new`], so a history read from a
/// file is sorted the same way as one built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct LoadTable {
    points: Vec<(f64, f64)>,
}

impl LoadTable {
    /// Sort `points` by time; NaN times are rejected
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if let Some(index) = points.iter().position(|(time, _)| time.is_nan()) {
            return Err(ConstraintError::invalid_rhs(format!(
                "load table point {} has a NaN time",
                index
            )));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl TryFrom<Vec<(f64, f64)>> for LoadTable {
    type Error = ConstraintError;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<LoadTable> for Vec<(f64, f64)> {
    fn from(table: LoadTable) -> Self {
        table.points
    }
}

fn interpolate(points: &[(f64, f64)], t: f64) -> f64 {
    match points.len() {
        0 => 0.0,
        1 => points[0].1,
        n => {
            // segment [k-1, k] containing t, clamped to the first/last segment
            let k = points.partition_point(|&(time, _)| time <= t).clamp(1, n - 1);
            let (t0, v0) = points[k - 1];
            let (t1, v1) = points[k];
            if t1 == t0 {
                return v1;
            }
            v0 + (v1 - v0) * (t - t0) / (t1 - t0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_ignores_time() {
        let rhs = RhsFunction::Constant(2.5);
        assert_eq!(rhs.value(-10.0), 2.5);
        assert_eq!(rhs.value(1e6), 2.5);
    }

    #[test]
    fn ramp_extrapolates_beyond_end_time() {
        let rhs = RhsFunction::ramp(2.0, 10.0);
        assert_relative_eq!(rhs.value(0.0), 0.0);
        assert_relative_eq!(rhs.value(1.0), 5.0);
        assert_relative_eq!(rhs.value(2.0), 10.0);
        assert_relative_eq!(rhs.value(3.0), 15.0);
        assert_relative_eq!(rhs.value(-1.0), -5.0);
    }

    #[test]
    fn table_interpolates_and_extrapolates() {
        let rhs = RhsFunction::table(vec![(1.0, 2.0), (0.0, 0.0), (2.0, 2.0)]).unwrap();

        assert_relative_eq!(rhs.value(0.5), 1.0);
        assert_relative_eq!(rhs.value(1.0), 2.0);
        assert_relative_eq!(rhs.value(1.5), 2.0);
        // continues the first and last segments
        assert_relative_eq!(rhs.value(-1.0), -2.0);
        assert_relative_eq!(rhs.value(3.0), 2.0);
    }

    #[test]
    fn single_point_table_is_constant() {
        let rhs = RhsFunction::table(vec![(1.0, 4.0)]).unwrap();
        assert_eq!(rhs.value(-3.0), 4.0);
        assert_eq!(rhs.value(9.0), 4.0);
    }

    #[test]
    fn custom_function_is_called() {
        let rhs = RhsFunction::custom(|t| t * t);
        assert_relative_eq!(rhs.value(3.0), 9.0);
        assert!(!rhs.is_homogeneous());
    }

    #[test]
    fn homogeneity() {
        assert!(RhsFunction::zero().is_homogeneous());
        assert!(RhsFunction::ramp(1.0, 0.0).is_homogeneous());
        assert!(!RhsFunction::ramp(1.0, 1.0).is_homogeneous());
    }

    #[test]
    fn load_history_from_json() {
        let rhs: RhsFunction =
            serde_json::from_str(r#"{ "table": [[0.0, 0.0], [1.0, 0.5], [2.0, 0.0]] }"#).unwrap();
        assert_relative_eq!(rhs.value(1.5), 0.25);

        let ramp: RhsFunction =
            serde_json::from_str(r#"{ "ramp": { "time_end": 4.0, "value_end": 2.0 } }"#).unwrap();
        assert_relative_eq!(ramp.value(2.0), 1.0);
    }

    #[test]
    fn unsorted_json_table_matches_constructor() {
        let built = RhsFunction::table(vec![(1.0, 2.0), (0.0, 0.0), (2.0, 2.0)]).unwrap();
        let loaded: RhsFunction =
            serde_json::from_str(r#"{ "table": [[1.0, 2.0], [0.0, 0.0], [2.0, 2.0]] }"#).unwrap();

        for &t in &[-0.5, 0.0, 0.5, 1.0, 1.5, 2.5] {
            assert_eq!(loaded.value(t), built.value(t));
        }
        assert_relative_eq!(loaded.value(0.5), 1.0);
    }

    #[test]
    fn nan_time_is_rejected() {
        let err = RhsFunction::table(vec![(0.0, 1.0), (f64::NAN, 2.0)]).unwrap_err();
        assert!(matches!(err, ConstraintError::InvalidRhs(_)));

        let table = LoadTable::try_from(vec![(0.0, 1.0), (f64::NAN, 2.0)]);
        assert!(table.is_err());
    }

    #[test]
    fn table_serializes_sorted_points() {
        let rhs = RhsFunction::table(vec![(2.0, 1.0), (0.0, 0.0)]).unwrap();
        let json = serde_json::to_string(&rhs).unwrap();
        assert_eq!(json, r#"{"table":[[0.0,0.0],[2.0,1.0]]}"#);
    }
}
