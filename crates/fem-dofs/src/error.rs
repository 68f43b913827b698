//! Error types for fem-dofs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DofError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DofError {
    #[error("No such DOF type registered: {0}")]
    UnknownDofType(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl DofError {
    /// Create an unknown DOF type error.
    pub fn unknown_dof_type(msg: impl Into<String>) -> Self {
        Self::UnknownDofType(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }
}
