//! Per-DOF-type value storage.

use crate::dof_type::DofType;
use crate::error::{DofError, Result};
use std::collections::BTreeMap;

/// Mapping from `DofType` to a value of type `T`.
///
/// Lookups of a type that was never inserted fail with
/// `DofError::UnknownDofType` instead of returning a default. Iteration is
/// ordered by DOF type id.
#[derive(Debug, Clone, PartialEq)]
pub struct DofContainer<T> {
    data: BTreeMap<DofType, T>,
}

impl<T> DofContainer<T> {
    /// Create an empty container
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Insert or replace the value stored for `dof`
    pub fn insert(&mut self, dof: DofType, value: T) -> Option<T> {
        self.data.insert(dof, value)
    }

    /// Value stored for `dof`
    pub fn at(&self, dof: &DofType) -> Result<&T> {
        self.data
            .get(dof)
            .ok_or_else(|| DofError::unknown_dof_type(dof.to_string()))
    }

    /// Mutable value stored for `dof`
    pub fn at_mut(&mut self, dof: &DofType) -> Result<&mut T> {
        self.data
            .get_mut(dof)
            .ok_or_else(|| DofError::unknown_dof_type(dof.to_string()))
    }

    pub fn get(&self, dof: &DofType) -> Option<&T> {
        self.data.get(dof)
    }

    pub fn contains(&self, dof: &DofType) -> bool {
        self.data.contains_key(dof)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DofType, &T)> {
        self.data.iter()
    }

    /// All registered DOF types, ordered by id
    pub fn dof_types(&self) -> Vec<DofType> {
        self.data.keys().cloned().collect()
    }
}

impl<T> Default for DofContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(DofType, T)> for DofContainer<T> {
    fn from_iter<I: IntoIterator<Item = (DofType, T)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}
