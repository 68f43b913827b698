//! Repository of linear constraint equations, grouped by DOF type.
//!
//! The set is filled by the boundary-condition layer and then only read. For
//! each DOF type it provides:
//! - the unit constraint matrix `C` mapping independent unknowns to all DOFs
//! - the prescribed-value vector `r(t)`, dense or sparse
//!
//! so that `u = C·x + r(t)` satisfies every equation of that type.

use crate::config::ConstraintConfig;
use crate::elimination::Elimination;
use crate::equation::Equation;
use crate::error::{ConstraintError, Result};
use crate::sparse_rhs::SparseRhs;
use fem_dofs::{DofContainer, DofType};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use tracing::{debug, trace};

/// Constraint equations of all DOF types
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    equations: DofContainer<Vec<Equation>>,
    num_dofs: DofContainer<usize>,
    config: ConstraintConfig,
}

impl ConstraintSet {
    /// Create an empty constraint set with default tolerances
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty constraint set with the given tolerances
    pub fn with_config(config: ConstraintConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }

    /// Add one equation for `dof`
    pub fn add(&mut self, dof: &DofType, equation: Equation) -> &mut Self {
        if let Ok(list) = self.equations.at_mut(dof) {
            list.push(equation);
        } else {
            self.equations.insert(dof.clone(), vec![equation]);
        }
        self
    }

    /// Add several equations for `dof`
    pub fn add_all(
        &mut self,
        dof: &DofType,
        equations: impl IntoIterator<Item = Equation>,
    ) -> &mut Self {
        for equation in equations {
            self.add(dof, equation);
        }
        self
    }

    /// Register the total number of DOFs of `dof`; later requests must agree with it
    pub fn register_num_dofs(&mut self, dof: &DofType, num_total: usize) -> &mut Self {
        self.num_dofs.insert(dof.clone(), num_total);
        self
    }

    /// Registered total number of DOFs of `dof`
    pub fn num_dofs(&self, dof: &DofType) -> Result<usize> {
        Ok(*self.num_dofs.at(dof)?)
    }

    /// Equations of `dof`, empty if none were added
    pub fn equations(&self, dof: &DofType) -> &[Equation] {
        self.equations.get(dof).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_equations(&self, dof: &DofType) -> usize {
        self.equations(dof).len()
    }

    pub fn has_constraints(&self, dof: &DofType) -> bool {
        !self.equations(dof).is_empty()
    }

    /// True if any equation of `dof` couples several DOFs
    pub fn has_interacting_constraints(&self, dof: &DofType) -> bool {
        self.equations(dof).iter().any(Equation::is_interacting)
    }

    /// DOF types with at least one equation
    pub fn dof_types(&self) -> Vec<DofType> {
        self.equations
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(dof, _)| dof.clone())
            .collect()
    }

    /// Dependent DOFs of `dof`, sorted
    pub fn dependent_dofs(&self, dof: &DofType) -> Vec<usize> {
        let mut dofs: Vec<usize> = self
            .equations(dof)
            .iter()
            .map(Equation::dependent_dof)
            .collect();
        dofs.sort_unstable();
        dofs.dedup();
        dofs
    }

    /// Independent DOFs of `dof`, in the column order of the unit constraint matrix
    pub fn independent_dofs(&self, dof: &DofType, num_total: usize) -> Result<Vec<usize>> {
        Ok(self.eliminate(dof, num_total)?.independent_dofs().to_vec())
    }

    /// Unit constraint matrix of `dof` (`num_total × num_independent`).
    ///
    /// Rows of independent DOFs are unit rows; rows of dependent DOFs express
    /// them through the independent unknowns.
    pub fn build_unit_constraint_matrix(
        &self,
        dof: &DofType,
        num_total: usize,
    ) -> Result<CsrMatrix<f64>> {
        Ok(self.unit_constraint_block(dof, num_total)?.1)
    }

    /// Elimination of `dof` together with its unit constraint matrix
    pub(crate) fn unit_constraint_block(
        &self,
        dof: &DofType,
        num_total: usize,
    ) -> Result<(Elimination, CsrMatrix<f64>)> {
        let elimination = self.eliminate(dof, num_total)?;
        let matrix = elimination.unit_matrix(self.config.drop_tolerance)?;

        debug!(
            dof = %dof,
            num_total,
            num_independent = elimination.num_independent(),
            nnz = matrix.nnz(),
            "built unit constraint matrix"
        );

        Ok((elimination, matrix))
    }

    /// Prescribed values of `dof` at pseudo-time `t`, sized by the registered DOF count
    pub fn get_rhs(&self, dof: &DofType, t: f64) -> Result<DVector<f64>> {
        let num_total = self.num_dofs(dof)?;
        Ok(self.get_sparse_global_rhs(dof, num_total, t)?.to_dvector())
    }

    /// Prescribed values of `dof` at pseudo-time `t`, stored at the dependent DOFs only
    pub fn get_sparse_global_rhs(
        &self,
        dof: &DofType,
        num_total: usize,
        t: f64,
    ) -> Result<SparseRhs> {
        let elimination = self.eliminate(dof, num_total)?;
        let rhs = elimination.rhs(self.equations(dof), t)?;

        trace!(dof = %dof, t, nnz = rhs.nnz(), "evaluated constraint rhs");

        Ok(rhs)
    }

    fn eliminate(&self, dof: &DofType, num_total: usize) -> Result<Elimination> {
        self.check_num_dofs(dof, num_total)?;
        Elimination::new(self.equations(dof), num_total, &self.config)
    }

    fn check_num_dofs(&self, dof: &DofType, num_total: usize) -> Result<()> {
        match self.num_dofs.get(dof) {
            Some(&registered) if registered != num_total => {
                Err(ConstraintError::dimension_mismatch(format!(
                    "{} has {} registered DOFs, {} requested",
                    dof, registered, num_total
                )))
            }
            _ => Ok(()),
        }
    }
}
