//! Linear constraint equations.
//!
//! An equation relates DOFs of a single DOF type:
//!
//! ```text
//! c_dep · u_dep + Σ cᵢ · uᵢ = rhs(t)
//! ```
//!
//! The first term names the dependent DOF that is eliminated from the system;
//! the remaining terms are expressed through the independent unknowns.

use crate::rhs::RhsFunction;
use serde::{Deserialize, Serialize};

/// One `coefficient · u[dof]` summand of an equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// DOF index within its DOF type (0-based)
    pub dof: usize,
    pub coefficient: f64,
}

impl Term {
    pub fn new(dof: usize, coefficient: f64) -> Self {
        Self { dof, coefficient }
    }
}

/// A linear constraint equation with a time-dependent right-hand side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equation {
    /// Term of the DOF eliminated by this equation
    pub dependent: Term,
    /// Remaining terms
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub rhs: RhsFunction,
}

impl Equation {
    /// `coefficient · u[dependent_dof] = rhs(t)`; add further terms with `with_term`
    pub fn new(dependent_dof: usize, coefficient: f64, rhs: RhsFunction) -> Self {
        Self {
            dependent: Term::new(dependent_dof, coefficient),
            terms: Vec::new(),
            rhs,
        }
    }

    /// Fix `dof` to a constant value
    pub fn fixed(dof: usize, value: f64) -> Self {
        Self::new(dof, 1.0, RhsFunction::Constant(value))
    }

    /// Prescribe `dof` to follow `rhs(t)`
    pub fn prescribed(dof: usize, rhs: RhsFunction) -> Self {
        Self::new(dof, 1.0, rhs)
    }

    /// `u[dependent] = u[master]`
    pub fn tie(dependent: usize, master: usize) -> Self {
        Self::new(dependent, 1.0, RhsFunction::zero()).with_term(master, -1.0)
    }

    pub fn with_term(mut self, dof: usize, coefficient: f64) -> Self {
        self.terms.push(Term::new(dof, coefficient));
        self
    }

    pub fn dependent_dof(&self) -> usize {
        self.dependent.dof
    }

    /// Right-hand side at pseudo-time `t`
    pub fn rhs_value(&self, t: f64) -> f64 {
        self.rhs.value(t)
    }

    /// True for multi-point equations that couple the dependent DOF to others
    pub fn is_interacting(&self) -> bool {
        self.terms.iter().any(|term| term.coefficient != 0.0)
    }

    /// Left-hand side `Σ cᵢ·u[dofᵢ]` evaluated for a full vector of this DOF type.
    ///
    /// `None` if `u` is too short for one of the referenced DOFs.
    pub fn lhs_value(&self, u: &[f64]) -> Option<f64> {
        std::iter::once(&self.dependent)
            .chain(self.terms.iter())
            .map(|term| u.get(term.dof).map(|value| term.coefficient * value))
            .sum()
    }
}
