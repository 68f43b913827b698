//! DOF-indexed sparse block matrices.
//!
//! Blocks are stored per `(row type, column type)` pair and flattened into a
//! single CSR matrix on demand. Flattening collects `(row, col, value)`
//! triplets with the block offsets applied and compresses them once:
//! - block rows must agree on their row count
//! - block columns must agree on their column count
//! - every requested block must be present (store explicit zero blocks)

use crate::dof_type::DofType;
use crate::error::{DofError, Result};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::BTreeMap;

/// Sparse matrix made of one CSR block per pair of DOF types
#[derive(Debug, Clone, Default)]
pub struct DofMatrixSparse {
    blocks: BTreeMap<(DofType, DofType), CsrMatrix<f64>>,
}

impl DofMatrixSparse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the block coupling `row` to `col`
    pub fn set_block(&mut self, row: DofType, col: DofType, block: CsrMatrix<f64>) {
        self.blocks.insert((row, col), block);
    }

    /// Store an explicit all-zero block of the given shape
    pub fn set_zero_block(&mut self, row: DofType, col: DofType, nrows: usize, ncols: usize) {
        self.blocks.insert((row, col), CsrMatrix::zeros(nrows, ncols));
    }

    /// Block coupling `row` to `col`; a pair that was never set is a `DimensionMismatch`
    pub fn block(&self, row: &DofType, col: &DofType) -> Result<&CsrMatrix<f64>> {
        self.blocks
            .get(&(row.clone(), col.clone()))
            .ok_or_else(|| {
                DofError::dimension_mismatch(format!("block ({}, {}) not set", row, col))
            })
    }

    /// Number of stored entries outside the diagonal blocks of `dof_types`
    pub fn off_diagonal_nnz(&self, dof_types: &[DofType]) -> usize {
        let mut nnz = 0;
        for row in dof_types {
            for col in dof_types {
                if row == col {
                    continue;
                }
                if let Ok(block) = self.block(row, col) {
                    nnz += block.nnz();
                }
            }
        }
        nnz
    }

    /// Flatten the blocks of `dof_types` into one CSR matrix.
    ///
    /// Block `(i, j)` lands at the row offset of type `i` and the column
    /// offset of type `j`, both following the order of `dof_types`.
    pub fn to_csr(&self, dof_types: &[DofType]) -> Result<CsrMatrix<f64>> {
        let row_sizes = self.block_sizes(dof_types, |block| block.nrows(), true)?;
        let col_sizes = self.block_sizes(dof_types, |block| block.ncols(), false)?;

        let row_offsets = offsets(&row_sizes);
        let col_offsets = offsets(&col_sizes);
        let nrows: usize = row_sizes.iter().sum();
        let ncols: usize = col_sizes.iter().sum();

        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut values = Vec::new();

        for (i, row_dof) in dof_types.iter().enumerate() {
            for (j, col_dof) in dof_types.iter().enumerate() {
                let block = self.block(row_dof, col_dof)?;
                for (r, c, &v) in block.triplet_iter() {
                    rows.push(row_offsets[i] + r);
                    cols.push(col_offsets[j] + c);
                    values.push(v);
                }
            }
        }

        let coo = CooMatrix::try_from_triplets(nrows, ncols, rows, cols, values)
            .map_err(|e| DofError::dimension_mismatch(format!("Failed to create COO matrix: {:?}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Size of every block row (`by_row`) or block column, checked for consistency
    fn block_sizes(
        &self,
        dof_types: &[DofType],
        size_of: impl Fn(&CsrMatrix<f64>) -> usize,
        by_row: bool,
    ) -> Result<Vec<usize>> {
        let mut sizes = Vec::with_capacity(dof_types.len());
        for outer in dof_types {
            let mut size: Option<usize> = None;
            for inner in dof_types {
                let block = if by_row {
                    self.block(outer, inner)?
                } else {
                    self.block(inner, outer)?
                };
                let n = size_of(block);
                match size {
                    None => size = Some(n),
                    Some(expected) if expected != n => {
                        return Err(DofError::dimension_mismatch(format!(
                            "blocks of {} disagree in size ({} vs {})",
                            outer, expected, n
                        )));
                    }
                    Some(_) => {}
                }
            }
            sizes.push(size.unwrap_or(0));
        }
        Ok(sizes)
    }
}

fn offsets(sizes: &[usize]) -> Vec<usize> {
    let mut acc = 0;
    sizes
        .iter()
        .map(|&n| {
            let start = acc;
            acc += n;
            start
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn displacements() -> DofType {
        DofType::new("displacements", 0, 2)
    }

    fn temperature() -> DofType {
        DofType::new("temperature", 1, 1)
    }

    fn csr_from_dense(dense: &DMatrix<f64>) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(dense.nrows(), dense.ncols());
        for i in 0..dense.nrows() {
            for j in 0..dense.ncols() {
                if dense[(i, j)] != 0.0 {
                    coo.push(i, j, dense[(i, j)]);
                }
            }
        }
        CsrMatrix::from(&coo)
    }

    fn to_dense(csr: &CsrMatrix<f64>) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(csr.nrows(), csr.ncols());
        for (i, j, &v) in csr.triplet_iter() {
            dense[(i, j)] += v;
        }
        dense
    }

    #[test]
    fn block_diagonal_assembly_places_offsets() {
        let d = displacements();
        let t = temperature();

        let kd = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.5, 0.5]);
        let kt = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 3.0]);

        let mut m = DofMatrixSparse::new();
        m.set_block(d.clone(), d.clone(), csr_from_dense(&kd));
        m.set_block(t.clone(), t.clone(), csr_from_dense(&kt));
        m.set_zero_block(d.clone(), t.clone(), 3, 2);
        m.set_zero_block(t.clone(), d.clone(), 2, 2);

        let flat = to_dense(&m.to_csr(&[d.clone(), t.clone()]).unwrap());
        assert_eq!(flat.shape(), (5, 4));
        assert_eq!(flat[(2, 0)], 0.5);
        assert_eq!(flat[(2, 1)], 0.5);
        assert_eq!(flat[(3, 2)], 2.0);
        assert_eq!(flat[(4, 3)], 3.0);
        assert_eq!(flat[(0, 2)], 0.0);
        assert_eq!(m.off_diagonal_nnz(&[d, t]), 0);
    }

    #[test]
    fn reversed_type_order_swaps_blocks() {
        let d = displacements();
        let t = temperature();

        let mut m = DofMatrixSparse::new();
        m.set_block(d.clone(), d.clone(), csr_from_dense(&DMatrix::identity(2, 2)));
        m.set_block(t.clone(), t.clone(), csr_from_dense(&(DMatrix::identity(1, 1) * 7.0)));
        m.set_zero_block(d.clone(), t.clone(), 2, 1);
        m.set_zero_block(t.clone(), d.clone(), 1, 2);

        let flat = to_dense(&m.to_csr(&[t, d]).unwrap());
        assert_eq!(flat[(0, 0)], 7.0);
        assert_eq!(flat[(1, 1)], 1.0);
        assert_eq!(flat[(2, 2)], 1.0);
    }

    #[test]
    fn missing_block_is_reported() {
        let d = displacements();
        let t = temperature();

        let mut m = DofMatrixSparse::new();
        m.set_block(d.clone(), d.clone(), CsrMatrix::identity(2));
        m.set_block(t.clone(), t.clone(), CsrMatrix::identity(1));

        let err = m.to_csr(&[d.clone(), t.clone()]).unwrap_err();
        assert!(matches!(err, DofError::DimensionMismatch(_)));
        assert!(err.to_string().contains("not set"));

        let err = m.block(&d, &t).unwrap_err();
        assert!(matches!(err, DofError::DimensionMismatch(_)));
        assert!(m.block(&t, &t).is_ok());
    }

    #[test]
    fn inconsistent_block_shapes_are_rejected() {
        let d = displacements();
        let t = temperature();

        let mut m = DofMatrixSparse::new();
        m.set_block(d.clone(), d.clone(), CsrMatrix::identity(2));
        m.set_block(t.clone(), t.clone(), CsrMatrix::identity(1));
        m.set_zero_block(d.clone(), t.clone(), 3, 1);
        m.set_zero_block(t.clone(), d.clone(), 1, 2);

        let err = m.to_csr(&[d, t]).unwrap_err();
        assert!(matches!(err, DofError::DimensionMismatch(_)));
    }

    #[test]
    fn off_diagonal_entries_are_counted() {
        let d = displacements();
        let t = temperature();

        let mut m = DofMatrixSparse::new();
        m.set_block(d.clone(), t.clone(), csr_from_dense(&DMatrix::from_element(2, 1, 1.0)));

        assert_eq!(m.off_diagonal_nnz(&[d, t]), 2);
    }
}
