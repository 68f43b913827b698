//! Linear constraint elimination for the finite element solver.
//!
//! Constraint equations (prescribed values, multi-point couplings) are
//! enforced by substitution instead of penalty terms: every constrained DOF is
//! expressed through the independent unknowns, and the global system is
//! projected into the space of those unknowns.
//!
//! # Architecture
//!
//! ```text
//! Boundary conditions ──► ConstraintSet (equations per DofType)
//!                              │  unit matrix C, rhs r(t)
//!                              ▼
//!                      ReducedSolutionSpace (block matrix Ĉ)
//!                              │  Ĉᵗ K Ĉ, Ĉᵗ R, Ĉ x + r(t)
//!                              ▼
//!                      Nonlinear / time-stepping solver
//! ```

pub mod config;
pub mod constraint_set;
mod elimination;
pub mod equation;
pub mod error;
pub mod reduced_space;
pub mod rhs;
pub mod sparse_rhs;

pub use config::ConstraintConfig;
pub use constraint_set::ConstraintSet;
pub use equation::{Equation, Term};
pub use error::{ConstraintError, Result};
pub use reduced_space::ReducedSolutionSpace;
pub use rhs::{LoadTable, RhsFunction, TimeFn};
pub use sparse_rhs::SparseRhs;
