//! Sparse prescribed-value vectors.

use crate::error::{ConstraintError, Result};
use nalgebra::DVector;

/// Prescribed values of one DOF type stored at the dependent positions only
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRhs {
    len: usize,
    /// `(index, value)` sorted by index, indices unique
    entries: Vec<(usize, f64)>,
}

impl SparseRhs {
    /// Build from `(index, value)` pairs; entries are sorted, indices must be `< len` and unique
    pub fn new(len: usize, mut entries: Vec<(usize, f64)>) -> Result<Self> {
        entries.sort_by_key(|&(i, _)| i);
        if let Some(&(i, _)) = entries.iter().find(|&&(i, _)| i >= len) {
            return Err(ConstraintError::dimension_mismatch(format!(
                "index {} out of range for vector of length {}",
                i, len
            )));
        }
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ConstraintError::topology(format!(
                "index {} prescribed twice",
                pair[0].0
            )));
        }
        Ok(Self { len, entries })
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            entries: Vec::new(),
        }
    }

    /// Length of the dense equivalent
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Value at `index`; zero where nothing is stored
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn to_dvector(&self) -> DVector<f64> {
        let mut dense = DVector::zeros(self.len);
        for &(i, v) in &self.entries {
            dense[i] = v;
        }
        dense
    }

    /// `self - other`, merging the two sparsity patterns
    pub fn sub(&self, other: &SparseRhs) -> Result<SparseRhs> {
        if self.len != other.len {
            return Err(ConstraintError::dimension_mismatch(format!(
                "cannot subtract vectors of length {} and {}",
                self.len, other.len
            )));
        }

        let mut entries = Vec::with_capacity(self.entries.len().max(other.entries.len()));
        let (mut a, mut b) = (self.entries.iter().peekable(), other.entries.iter().peekable());
        loop {
            let next_a = a.peek().map(|&&entry| entry);
            let next_b = b.peek().map(|&&entry| entry);
            match (next_a, next_b) {
                (Some((ia, va)), Some((ib, vb))) => {
                    if ia == ib {
                        entries.push((ia, va - vb));
                        a.next();
                        b.next();
                    } else if ia < ib {
                        entries.push((ia, va));
                        a.next();
                    } else {
                        entries.push((ib, -vb));
                        b.next();
                    }
                }
                (Some((ia, va)), None) => {
                    entries.push((ia, va));
                    a.next();
                }
                (None, Some((ib, vb))) => {
                    entries.push((ib, -vb));
                    b.next();
                }
                (None, None) => break,
            }
        }

        Ok(SparseRhs {
            len: self.len,
            entries,
        })
    }

    /// Add the entries into `target` starting at `offset`
    pub fn add_to(&self, target: &mut DVector<f64>, offset: usize) -> Result<()> {
        if offset + self.len > target.len() {
            return Err(ConstraintError::dimension_mismatch(format!(
                "block of length {} at offset {} exceeds target of length {}",
                self.len,
                offset,
                target.len()
            )));
        }
        for &(i, v) in &self.entries {
            target[offset + i] += v;
        }
        Ok(())
    }
}
