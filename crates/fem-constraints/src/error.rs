//! Error types for fem-constraints

use fem_dofs::DofError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConstraintError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintError {
    #[error("No such DOF type registered: {0}")]
    UnknownDofType(String),

    #[error("Constraint topology error: {0}")]
    ConstraintTopology(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Invalid right-hand side: {0}")]
    InvalidRhs(String),
}

impl ConstraintError {
    /// Create an unknown DOF type error.
    pub fn unknown_dof_type(msg: impl Into<String>) -> Self {
        Self::UnknownDofType(msg.into())
    }

    /// Create a constraint topology error.
    pub fn topology(msg: impl Into<String>) -> Self {
        Self::ConstraintTopology(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Create an unsupported configuration error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid right-hand side error.
    pub fn invalid_rhs(msg: impl Into<String>) -> Self {
        Self::InvalidRhs(msg.into())
    }
}

impl From<DofError> for ConstraintError {
    fn from(err: DofError) -> Self {
        match err {
            DofError::UnknownDofType(msg) => Self::UnknownDofType(msg),
            DofError::DimensionMismatch(msg) => Self::DimensionMismatch(msg),
        }
    }
}
