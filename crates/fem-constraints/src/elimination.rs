//! Elimination of dependent DOFs from the constraint equations of one DOF type.
//!
//! Every equation `c_d·u_d + Σ cᵢ·uᵢ = rhs(t)` is solved for its dependent
//! DOF:
//!
//! ```text
//! u_d = rhs(t)/c_d − Σ (cᵢ/c_d)·uᵢ
//! ```
//!
//! Terms that refer to another dependent DOF are substituted recursively, so
//! each dependent DOF ends up as
//!
//! ```text
//! u_d = Σ_k C[d,k]·x_k + Σ_e W[d,e]·rhs_e(t)
//! ```
//!
//! where `x` are the independent unknowns. `C` is the unit constraint matrix
//! and `W` maps the equation right-hand sides onto the dependent positions.
//! Substitution order is a depth-first post-order over the dependency graph;
//! a cycle in that graph has no unique solution and is rejected.

use crate::config::ConstraintConfig;
use crate::equation::Equation;
use crate::error::{ConstraintError, Result};
use crate::sparse_rhs::SparseRhs;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Dependent DOF expressed through independent unknowns and equation RHS values
#[derive(Debug, Clone, Default)]
struct EliminatedRow {
    /// `(independent column, coefficient)`
    columns: Vec<(usize, f64)>,
    /// `(equation index, weight)`
    weights: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Result of eliminating all dependent DOFs of one DOF type
#[derive(Debug, Clone)]
pub(crate) struct Elimination {
    num_total: usize,
    /// Independent DOFs in column order
    independent: Vec<usize>,
    /// Column of each DOF, `None` for dependent DOFs
    column_of: Vec<Option<usize>>,
    rows: BTreeMap<usize, EliminatedRow>,
}

impl Elimination {
    pub(crate) fn new(
        equations: &[Equation],
        num_total: usize,
        config: &ConstraintConfig,
    ) -> Result<Self> {
        let dependent_eq = validate(equations, num_total, config)?;

        let mut column_of = vec![None; num_total];
        let mut independent = Vec::with_capacity(num_total - dependent_eq.len());
        for dof in 0..num_total {
            if !dependent_eq.contains_key(&dof) {
                column_of[dof] = Some(independent.len());
                independent.push(dof);
            }
        }

        let mut elimination = Self {
            num_total,
            independent,
            column_of,
            rows: BTreeMap::new(),
        };
        elimination.substitute(equations, &dependent_eq)?;
        Ok(elimination)
    }

    pub(crate) fn num_independent(&self) -> usize {
        self.independent.len()
    }

    pub(crate) fn independent_dofs(&self) -> &[usize] {
        &self.independent
    }

    pub(crate) fn dependent_dofs(&self) -> Vec<usize> {
        self.rows.keys().copied().collect()
    }

    /// Unit constraint matrix `C` (`num_total × num_independent`)
    pub(crate) fn unit_matrix(&self, drop_tolerance: f64) -> Result<CsrMatrix<f64>> {
        let nnz = self.independent.len()
            + self.rows.values().map(|row| row.columns.len()).sum::<usize>();
        let mut rows = Vec::with_capacity(nnz);
        let mut cols = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        for (dof, column) in self.column_of.iter().enumerate() {
            match column {
                Some(col) => {
                    rows.push(dof);
                    cols.push(*col);
                    values.push(1.0);
                }
                None => {
                    if let Some(row) = self.rows.get(&dof) {
                        for &(col, v) in &row.columns {
                            if v.abs() > drop_tolerance {
                                rows.push(dof);
                                cols.push(col);
                                values.push(v);
                            }
                        }
                    }
                }
            }
        }

        let coo = CooMatrix::try_from_triplets(
            self.num_total,
            self.independent.len(),
            rows,
            cols,
            values,
        )
        .map_err(|e| {
            ConstraintError::dimension_mismatch(format!("Failed to create COO matrix: {:?}", e))
        })?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Prescribed values at the dependent positions for pseudo-time `t`
    pub(crate) fn rhs(&self, equations: &[Equation], t: f64) -> Result<SparseRhs> {
        let values: Vec<f64> = equations.iter().map(|eq| eq.rhs_value(t)).collect();

        let entries = self
            .rows
            .iter()
            .map(|(&dof, row)| {
                let value = row.weights.iter().map(|&(e, w)| w * values[e]).sum();
                (dof, value)
            })
            .collect();

        SparseRhs::new(self.num_total, entries)
    }

    /// Resolve every dependent DOF, children before parents
    fn substitute(
        &mut self,
        equations: &[Equation],
        dependent_eq: &HashMap<usize, usize>,
    ) -> Result<()> {
        let mut marks: HashMap<usize, Mark> = HashMap::with_capacity(dependent_eq.len());
        let mut stack: Vec<(usize, bool)> = Vec::new();

        let mut roots: Vec<usize> = dependent_eq.keys().copied().collect();
        roots.sort_unstable();

        for root in roots {
            if marks.contains_key(&root) {
                continue;
            }
            stack.push((root, false));

            while let Some((dof, expanded)) = stack.pop() {
                let eq_index = dependent_eq[&dof];
                let equation = &equations[eq_index];

                if expanded {
                    let row = self.eliminate(eq_index, equation);
                    self.rows.insert(dof, row);
                    marks.insert(dof, Mark::Done);
                    continue;
                }

                match marks.get(&dof) {
                    Some(Mark::Done) => continue,
                    Some(Mark::Visiting) => return Err(cycle_error(dof)),
                    None => {}
                }

                marks.insert(dof, Mark::Visiting);
                stack.push((dof, true));

                for term in &equation.terms {
                    if !dependent_eq.contains_key(&term.dof) {
                        continue;
                    }
                    match marks.get(&term.dof) {
                        Some(Mark::Done) => {}
                        Some(Mark::Visiting) => return Err(cycle_error(term.dof)),
                        None => stack.push((term.dof, false)),
                    }
                }
            }
        }

        Ok(())
    }

    /// Solve `equation` for its dependent DOF; all dependent terms are already resolved
    fn eliminate(&self, eq_index: usize, equation: &Equation) -> EliminatedRow {
        let inv = 1.0 / equation.dependent.coefficient;

        let mut columns: BTreeMap<usize, f64> = BTreeMap::new();
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        weights.insert(eq_index, inv);

        for term in &equation.terms {
            let factor = -term.coefficient * inv;
            if factor == 0.0 {
                continue;
            }
            match self.column_of[term.dof] {
                Some(col) => *columns.entry(col).or_insert(0.0) += factor,
                None => {
                    let Some(child) = self.rows.get(&term.dof) else {
                        continue;
                    };
                    for &(col, v) in &child.columns {
                        *columns.entry(col).or_insert(0.0) += factor * v;
                    }
                    for &(e, w) in &child.weights {
                        *weights.entry(e).or_insert(0.0) += factor * w;
                    }
                }
            }
        }

        EliminatedRow {
            columns: columns.into_iter().filter(|&(_, v)| v != 0.0).collect(),
            weights: weights.into_iter().filter(|&(_, w)| w != 0.0).collect(),
        }
    }
}

/// Check ranges, pivots and uniqueness of dependent DOFs; returns dependent DOF → equation index
fn validate(
    equations: &[Equation],
    num_total: usize,
    config: &ConstraintConfig,
) -> Result<HashMap<usize, usize>> {
    let mut dependent_eq = HashMap::with_capacity(equations.len());

    for (index, equation) in equations.iter().enumerate() {
        let dependent = equation.dependent;
        if dependent.dof >= num_total {
            return Err(ConstraintError::topology(format!(
                "equation {} constrains DOF {} but only {} DOFs exist",
                index, dependent.dof, num_total
            )));
        }

        let pivot = dependent.coefficient.abs();
        if !pivot.is_finite() || pivot <= config.pivot_tolerance {
            return Err(ConstraintError::topology(format!(
                "equation {} has coefficient {} on its dependent DOF {}",
                index, dependent.coefficient, dependent.dof
            )));
        }
        if pivot < 1e3 * config.pivot_tolerance {
            warn!(
                equation = index,
                dof = dependent.dof,
                coefficient = dependent.coefficient,
                "dependent coefficient close to pivot tolerance"
            );
        }

        for term in &equation.terms {
            if term.dof >= num_total {
                return Err(ConstraintError::topology(format!(
                    "equation {} references DOF {} but only {} DOFs exist",
                    index, term.dof, num_total
                )));
            }
            if term.dof == dependent.dof {
                return Err(ConstraintError::topology(format!(
                    "equation {} references its own dependent DOF {}",
                    index, term.dof
                )));
            }
        }

        if let Some(previous) = dependent_eq.insert(dependent.dof, index) {
            return Err(ConstraintError::topology(format!(
                "DOF {} is the dependent DOF of equations {} and {} (over-constrained)",
                dependent.dof, previous, index
            )));
        }
    }

    Ok(dependent_eq)
}

fn cycle_error(dof: usize) -> ConstraintError {
    ConstraintError::topology(format!(
        "cyclic dependency between constraint equations through DOF {}",
        dof
    ))
}
