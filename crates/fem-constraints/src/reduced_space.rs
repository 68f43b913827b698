//! Projection between the full DOF space and the reduced space of independent unknowns.
//!
//! The block unit constraint matrix `Ĉ` is assembled once from the per-type
//! unit constraint matrices of a `ConstraintSet`:
//!
//! ```text
//!       ┌                 ┐
//!       │ C_1   0   ...   │
//!  Ĉ =  │  0   C_2  ...   │      full = Ĉ · reduced + r(t)
//!       │ ...  ...  ...   │
//!       └                 ┘
//! ```
//!
//! and then used read-only by every projection. The eliminations behind each
//! block are kept as well, so evaluating `r(t)` only evaluates the equation
//! right-hand sides. The solver loop reduces its
//! Jacobian and residual with `hessian_to_reduced_basis` /
//! `gradient_to_reduced_basis`, solves in the reduced space and expands the
//! result again with `to_full`, `to_full_with_rhs` or `delta_full`.
//!
//! # Example
//!
//! ```
//! use fem_constraints::{ConstraintSet, Equation, ReducedSolutionSpace, RhsFunction};
//! use fem_dofs::{DofContainer, DofType};
//! use nalgebra::DVector;
//!
//! let displacements = DofType::new("displacements", 0, 1);
//! let mut constraints = ConstraintSet::new();
//! constraints.add(&displacements, Equation::prescribed(2, RhsFunction::ramp(1.0, 5.0)));
//!
//! let mut num_dofs = DofContainer::new();
//! num_dofs.insert(displacements.clone(), 4usize);
//!
//! let space = ReducedSolutionSpace::new(&[displacements], num_dofs, &constraints).unwrap();
//! let full = space.to_full_with_rhs(&DVector::from_element(3, 1.0), 2.0).unwrap();
//! assert_eq!(full.as_slice(), &[1.0, 1.0, 10.0, 1.0]);
//! ```

use crate::constraint_set::ConstraintSet;
use crate::elimination::Elimination;
use crate::error::{ConstraintError, Result};
use fem_dofs::{DofContainer, DofMatrixSparse, DofType, DofVector};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Reduced solution space over a fixed set of active DOF types
#[derive(Debug, Clone)]
pub struct ReducedSolutionSpace<'a> {
    dof_types: Vec<DofType>,
    num_total_dofs: DofContainer<usize>,
    num_independent_dofs: DofContainer<usize>,
    constraints: &'a ConstraintSet,
    /// Elimination of each active type, in block order
    eliminations: Vec<Elimination>,
    /// Ĉ (`num_full × num_independent`)
    cmat_unit: CsrMatrix<f64>,
    /// Ĉᵗ, kept for the reductions
    cmat_unit_t: CsrMatrix<f64>,
}

impl<'a> ReducedSolutionSpace<'a> {
    /// Assemble `Ĉ` for `dof_types`, in that order.
    ///
    /// # Errors
    /// - `UnknownDofType` if a type has no entry in `num_total_dofs`
    /// - `ConstraintTopology` if a per-type unit matrix cannot be built or a
    ///   type is listed twice
    /// - `DimensionMismatch` if a count disagrees with the one registered in
    ///   `constraints`
    pub fn new(
        dof_types: &[DofType],
        num_total_dofs: DofContainer<usize>,
        constraints: &'a ConstraintSet,
    ) -> Result<Self> {
        if dof_types.is_empty() {
            return Err(ConstraintError::unsupported("no active DOF types"));
        }
        let mut seen = HashSet::with_capacity(dof_types.len());
        for dof in dof_types {
            if !seen.insert(dof) {
                return Err(ConstraintError::topology(format!(
                    "{} listed twice among the active DOF types",
                    dof
                )));
            }
        }

        let mut counts = Vec::with_capacity(dof_types.len());
        for dof in dof_types {
            counts.push(*num_total_dofs.at(dof)?);
        }

        let build = |(dof, &n): (&DofType, &usize)| constraints.unit_constraint_block(dof, n);
        let built: Vec<(Elimination, CsrMatrix<f64>)> = if constraints.config().parallel_assembly {
            dof_types
                .par_iter()
                .zip(counts.par_iter())
                .map(build)
                .collect::<Result<_>>()?
        } else {
            dof_types
                .iter()
                .zip(counts.iter())
                .map(build)
                .collect::<Result<_>>()?
        };
        let (eliminations, diagonal): (Vec<_>, Vec<_>) = built.into_iter().unzip();

        let independent: Vec<usize> = diagonal.iter().map(CsrMatrix::ncols).collect();
        let num_independent_dofs: DofContainer<usize> = dof_types
            .iter()
            .cloned()
            .zip(independent.iter().copied())
            .collect();

        let mut blocks = DofMatrixSparse::new();
        for (i, block) in diagonal.into_iter().enumerate() {
            for (j, dof_j) in dof_types.iter().enumerate() {
                if i != j {
                    blocks.set_zero_block(dof_types[i].clone(), dof_j.clone(), counts[i], independent[j]);
                }
            }
            blocks.set_block(dof_types[i].clone(), dof_types[i].clone(), block);
        }

        let coupling = blocks.off_diagonal_nnz(dof_types);
        if coupling != 0 {
            return Err(ConstraintError::topology(format!(
                "{} entries couple different DOF types",
                coupling
            )));
        }

        let cmat_unit = blocks.to_csr(dof_types)?;
        let cmat_unit_t = cmat_unit.transpose();

        debug!(
            dof_types = ?dof_types.iter().map(DofType::name).collect::<Vec<_>>(),
            num_full = cmat_unit.nrows(),
            num_independent = cmat_unit.ncols(),
            nnz = cmat_unit.nnz(),
            "assembled reduced solution space"
        );

        Ok(Self {
            dof_types: dof_types.to_vec(),
            num_total_dofs,
            num_independent_dofs,
            constraints,
            eliminations,
            cmat_unit,
            cmat_unit_t,
        })
    }

    /// Active DOF types in block order
    pub fn dof_types(&self) -> &[DofType] {
        &self.dof_types
    }

    pub fn num_full_dofs(&self) -> usize {
        self.cmat_unit.nrows()
    }

    pub fn num_independent_dofs(&self) -> usize {
        self.cmat_unit.ncols()
    }

    pub fn num_total_dofs(&self, dof: &DofType) -> Result<usize> {
        Ok(*self.num_total_dofs.at(dof)?)
    }

    /// Number of independent DOFs of one active type
    pub fn num_independent(&self, dof: &DofType) -> Result<usize> {
        Ok(*self.num_independent_dofs.at(dof)?)
    }

    /// The block unit constraint matrix `Ĉ`
    pub fn unit_constraint_matrix(&self) -> &CsrMatrix<f64> {
        &self.cmat_unit
    }

    /// `Ĉᵗ · M · Ĉ`
    pub fn hessian_to_reduced_basis(&self, matrix: &CsrMatrix<f64>) -> Result<CsrMatrix<f64>> {
        let n = self.num_full_dofs();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(ConstraintError::dimension_mismatch(format!(
                "system matrix is {}x{}, full space has {} DOFs",
                matrix.nrows(),
                matrix.ncols(),
                n
            )));
        }

        let projected = matrix * &self.cmat_unit;
        Ok(&self.cmat_unit_t * &projected)
    }

    /// `Ĉᵗ · g`
    pub fn gradient_to_reduced_basis(&self, gradient: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_full_len(gradient.len(), "gradient")?;
        Ok(mul_vec(&self.cmat_unit_t, gradient))
    }

    /// `Ĉ · x`, without prescribed values
    pub fn to_full(&self, independent: &DVector<f64>) -> Result<DVector<f64>> {
        if independent.len() != self.num_independent_dofs() {
            return Err(ConstraintError::dimension_mismatch(format!(
                "reduced vector has {} entries, reduced space has {} DOFs",
                independent.len(),
                self.num_independent_dofs()
            )));
        }
        Ok(mul_vec(&self.cmat_unit, independent))
    }

    /// `Ĉ · x + r(t)`: the full solution at pseudo-time `t`.
    ///
    /// With several active DOF types only homogeneous constraints are accepted.
    pub fn to_full_with_rhs(&self, independent: &DVector<f64>, time: f64) -> Result<DVector<f64>> {
        if self.dof_types.len() > 1 {
            let inhomogeneous = self.dof_types.iter().find(|dof| {
                self.constraints
                    .equations(dof)
                    .iter()
                    .any(|eq| !eq.rhs.is_homogeneous())
            });
            if let Some(dof) = inhomogeneous {
                return Err(ConstraintError::unsupported(format!(
                    "prescribed values of {} with {} simultaneously active DOF types",
                    dof,
                    self.dof_types.len()
                )));
            }
        }

        let mut full = self.to_full(independent)?;
        let mut offset = 0;
        for (dof, elimination) in self.dof_types.iter().zip(&self.eliminations) {
            let rhs = elimination.rhs(self.constraints.equations(dof), time)?;
            rhs.add_to(&mut full, offset)?;
            offset += rhs.len();
        }
        Ok(full)
    }

    /// Copy of `template` with the active blocks replaced by the slices of `full`
    pub fn to_dof_vector(&self, full: &DVector<f64>, template: &DofVector) -> Result<DofVector> {
        self.check_full_len(full.len(), "full vector")?;

        let fresh = DofVector::from_dvector(full, &self.dof_types, &self.num_total_dofs)?;
        let mut dof_vector = template.clone();
        for (dof, block) in fresh.iter() {
            dof_vector.insert(dof.clone(), block.clone());
        }
        Ok(dof_vector)
    }

    /// `Ĉ · x − Δr`
    pub fn delta_full(
        &self,
        independent: &DVector<f64>,
        delta_rhs: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        self.check_full_len(delta_rhs.len(), "rhs increment")?;
        Ok(self.to_full(independent)? - delta_rhs)
    }

    /// `r(t_new) − r(t_old)` over all active DOF types
    pub fn delta_full_rhs(&self, time_old: f64, time_new: f64) -> Result<DVector<f64>> {
        let mut delta = DVector::zeros(self.num_full_dofs());
        let mut offset = 0;
        for (dof, elimination) in self.dof_types.iter().zip(&self.eliminations) {
            let equations = self.constraints.equations(dof);
            let rhs_new = elimination.rhs(equations, time_new)?;
            let rhs_old = elimination.rhs(equations, time_old)?;
            rhs_new.sub(&rhs_old)?.add_to(&mut delta, offset)?;
            offset += rhs_new.len();
        }
        Ok(delta)
    }

    /// `Ĉᵗ` applied to the active blocks of `dof_vector`
    pub fn to_reduced_basis(&self, dof_vector: &DofVector) -> Result<DVector<f64>> {
        for dof in &self.dof_types {
            let expected = *self.num_total_dofs.at(dof)?;
            let actual = dof_vector.at(dof)?.len();
            if actual != expected {
                return Err(ConstraintError::dimension_mismatch(format!(
                    "block {} has {} entries, expected {}",
                    dof, actual, expected
                )));
            }
        }
        let full = dof_vector.to_dvector(&self.dof_types)?;
        self.gradient_to_reduced_basis(&full)
    }

    fn check_full_len(&self, len: usize, what: &str) -> Result<()> {
        if len != self.num_full_dofs() {
            return Err(ConstraintError::dimension_mismatch(format!(
                "{} has {} entries, full space has {} DOFs",
                what,
                len,
                self.num_full_dofs()
            )));
        }
        Ok(())
    }
}

/// `A · v` by row-wise accumulation
fn mul_vec(matrix: &CsrMatrix<f64>, v: &DVector<f64>) -> DVector<f64> {
    let mut result = DVector::zeros(matrix.nrows());
    for (row_idx, row) in matrix.row_iter().enumerate() {
        let mut sum = 0.0;
        for (&col_idx, &val) in row.col_indices().iter().zip(row.values().iter()) {
            sum += val * v[col_idx];
        }
        result[row_idx] = sum;
    }
    result
}
