//! Numerical settings for constraint elimination.

use serde::{Deserialize, Serialize};

/// Tolerances and assembly options used when eliminating dependent DOFs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    /// Entries of the unit constraint matrix with `|v| <= drop_tolerance` are not stored.
    ///
    /// The default `0.0` drops exact zeros only. A positive value trades
    /// sparsity for equation residuals of up to `drop_tolerance · |x|`, since
    /// the prescribed values are not adjusted for dropped couplings.
    pub drop_tolerance: f64,
    /// Minimum magnitude of the coefficient of a dependent DOF
    pub pivot_tolerance: f64,
    /// Build the per-type unit constraint matrices on the rayon thread pool
    pub parallel_assembly: bool,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            drop_tolerance: 0.0,
            pivot_tolerance: 1e-12,
            parallel_assembly: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ConstraintConfig =
            serde_json::from_str(r#"{ "parallel_assembly": false }"#).unwrap();

        assert!(!config.parallel_assembly);
        assert_eq!(config.drop_tolerance, 0.0);
        assert_eq!(config.pivot_tolerance, 1e-12);
    }
}
