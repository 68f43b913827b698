//! Degree-of-freedom bookkeeping for the finite element solver.
//!
//! This crate provides the typed building blocks shared by assembly and the
//! constraint machinery:
//! - `DofType`: identifier of a field of unknowns
//! - `DofContainer<T>`: per-type storage with checked lookups
//! - `DofVector`: one dense block per DOF type, convertible to a flat vector
//! - `DofMatrixSparse`: one sparse block per pair of DOF types

pub mod container;
pub mod dof_type;
pub mod error;
pub mod matrix_sparse;
pub mod vector;

pub use container::DofContainer;
pub use dof_type::DofType;
pub use error::{DofError, Result};
pub use matrix_sparse::DofMatrixSparse;
pub use vector::DofVector;
