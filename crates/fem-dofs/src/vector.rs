//! DOF-indexed dense vectors and their flat representation.
//!
//! The solver keeps multi-field states as one dense block per DOF type. Linear
//! algebra on the global system works on a single flat `DVector` in which the
//! blocks are stacked in a caller-chosen DOF type order.

use crate::container::DofContainer;
use crate::dof_type::DofType;
use crate::error::{DofError, Result};
use nalgebra::DVector;

/// One dense block per DOF type
pub type DofVector = DofContainer<DVector<f64>>;

impl DofContainer<DVector<f64>> {
    /// Zero blocks of the given sizes for every type in `counts`
    pub fn zeros(counts: &DofContainer<usize>) -> Self {
        counts
            .iter()
            .map(|(dof, &n)| (dof.clone(), DVector::zeros(n)))
            .collect()
    }

    /// Stack the blocks of `dof_types` into one flat vector
    pub fn to_dvector(&self, dof_types: &[DofType]) -> Result<DVector<f64>> {
        let mut total = 0;
        for dof in dof_types {
            total += self.at(dof)?.len();
        }

        let mut flat = DVector::zeros(total);
        let mut offset = 0;
        for dof in dof_types {
            let block = self.at(dof)?;
            flat.rows_mut(offset, block.len()).copy_from(block);
            offset += block.len();
        }
        Ok(flat)
    }

    /// Split a flat vector into blocks of `dof_types`, sized by `counts`
    pub fn from_dvector(
        flat: &DVector<f64>,
        dof_types: &[DofType],
        counts: &DofContainer<usize>,
    ) -> Result<Self> {
        let mut expected = 0;
        for dof in dof_types {
            expected += *counts.at(dof)?;
        }
        if expected != flat.len() {
            return Err(DofError::dimension_mismatch(format!(
                "flat vector has {} entries, DOF types require {}",
                flat.len(),
                expected
            )));
        }

        let mut blocks = DofVector::new();
        let mut offset = 0;
        for dof in dof_types {
            let n = *counts.at(dof)?;
            blocks.insert(dof.clone(), flat.rows(offset, n).into_owned());
            offset += n;
        }
        Ok(blocks)
    }

    /// Overwrite the blocks of `dof_types` with the matching slices of `flat`.
    ///
    /// Every target block keeps its length; `flat` must match their sum.
    pub fn replace_blocks(&mut self, flat: &DVector<f64>, dof_types: &[DofType]) -> Result<()> {
        let mut expected = 0;
        for dof in dof_types {
            expected += self.at(dof)?.len();
        }
        if expected != flat.len() {
            return Err(DofError::dimension_mismatch(format!(
                "replacement has {} entries, target blocks hold {}",
                flat.len(),
                expected
            )));
        }

        let mut offset = 0;
        for dof in dof_types {
            let block = self.at_mut(dof)?;
            let n = block.len();
            block.copy_from(&flat.rows(offset, n));
            offset += n;
        }
        Ok(())
    }
}
