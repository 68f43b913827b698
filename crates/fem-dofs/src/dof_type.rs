//! Degree-of-freedom type identifiers.
//!
//! A `DofType` names one physical field of the discretization, e.g. the
//! mechanical displacements or the temperature. Two DOF types are the same
//! field iff their ids match; the name and dimensionality are carried along
//! for diagnostics only.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of a field of unknowns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DofType {
    /// Human-readable field name ("displacements", "temperature", ...)
    name: String,
    /// Unique id, used for equality, hashing and ordering
    id: u32,
    /// Number of components per node (3 for 3D displacements, 1 for scalars)
    num: usize,
}

impl DofType {
    /// Create a new DOF type
    pub fn new(name: impl Into<String>, id: u32, num: usize) -> Self {
        Self {
            name: name.into(),
            id,
            num,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of components per node
    pub fn num(&self) -> usize {
        self.num
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for DofType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DofType {}

impl Hash for DofType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for DofType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DofType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for DofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id {})", self.name, self.id)
    }
}
