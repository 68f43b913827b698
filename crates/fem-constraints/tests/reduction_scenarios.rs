//! Scenario tests for the reduced solution space.
//!
//! Covers the reference configurations of the constraint engine:
//! 1. Unconstrained field (identity reduction)
//! 2. Single prescribed DOF with a ramp
//! 3. Over-constrained and mis-sized inputs
//! 4. Concurrent read-only use

use fem_constraints::{
    ConstraintError, ConstraintSet, Equation, ReducedSolutionSpace, RhsFunction,
};
use fem_dofs::{DofContainer, DofType, DofVector};
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

fn displacements() -> DofType {
    DofType::new("displacements", 0, 1)
}

fn temperature() -> DofType {
    DofType::new("temperature", 1, 1)
}

fn single_count(dof: DofType, n: usize) -> DofContainer<usize> {
    let mut counts = DofContainer::new();
    counts.insert(dof, n);
    counts
}

fn dense_row(c: &CsrMatrix<f64>, i: usize) -> Vec<f64> {
    let mut row = vec![0.0; c.ncols()];
    let r = c.row(i);
    for (&j, &v) in r.col_indices().iter().zip(r.values()) {
        row[j] = v;
    }
    row
}

#[test]
fn unconstrained_field_is_identity() {
    let constraints = ConstraintSet::new();
    let space =
        ReducedSolutionSpace::new(&[temperature()], single_count(temperature(), 5), &constraints)
            .expect("Construction should succeed");

    assert_eq!(space.num_full_dofs(), 5);
    assert_eq!(space.num_independent_dofs(), 5);

    let c = space.unit_constraint_matrix();
    assert_eq!(c.nnz(), 5);
    for i in 0..5 {
        let mut expected = vec![0.0; 5];
        expected[i] = 1.0;
        assert_eq!(dense_row(c, i), expected);
    }

    let x = DVector::from_vec(vec![1.0, -2.0, 3.5, 0.0, 9.0]);
    assert_eq!(space.to_full(&x).unwrap(), x);
    assert_eq!(space.to_full_with_rhs(&x, 3.0).unwrap(), x);
    assert_eq!(space.gradient_to_reduced_basis(&x).unwrap(), x);
}

#[test]
fn prescribed_ramp_on_four_dofs() {
    let d = displacements();
    let mut constraints = ConstraintSet::new();
    constraints
        .register_num_dofs(&d, 4)
        .add(&d, Equation::prescribed(2, RhsFunction::ramp(1.0, 5.0)));

    let c = constraints
        .build_unit_constraint_matrix(&d, 4)
        .expect("Unit matrix should build");
    assert_eq!((c.nrows(), c.ncols()), (4, 3));
    assert_eq!(dense_row(&c, 0), vec![1.0, 0.0, 0.0]);
    assert_eq!(dense_row(&c, 1), vec![0.0, 1.0, 0.0]);
    assert_eq!(dense_row(&c, 2), vec![0.0, 0.0, 0.0]);
    assert_eq!(dense_row(&c, 3), vec![0.0, 0.0, 1.0]);

    assert_eq!(
        constraints.get_rhs(&d, 2.0).unwrap().as_slice(),
        &[0.0, 0.0, 10.0, 0.0]
    );

    let space = ReducedSolutionSpace::new(&[d.clone()], single_count(d, 4), &constraints)
        .expect("Construction should succeed");
    let full = space
        .to_full_with_rhs(&DVector::from_vec(vec![1.0, 1.0, 1.0]), 2.0)
        .unwrap();
    assert_eq!(full.as_slice(), &[1.0, 1.0, 10.0, 1.0]);

    // the prescribed DOF drops out of the reduced residual
    let mut state = DofVector::new();
    state.insert(displacements(), full.clone());
    assert_eq!(
        space.to_reduced_basis(&state).unwrap().as_slice(),
        &[1.0, 1.0, 1.0]
    );
}

#[test]
fn mismatched_count_is_rejected() {
    let d = displacements();
    let mut constraints = ConstraintSet::new();
    constraints
        .register_num_dofs(&d, 4)
        .add(&d, Equation::fixed(0, 0.0));

    let err = constraints.build_unit_constraint_matrix(&d, 6).unwrap_err();
    assert!(matches!(err, ConstraintError::DimensionMismatch(_)));

    let err = ReducedSolutionSpace::new(&[d.clone()], single_count(d, 6), &constraints).unwrap_err();
    assert!(matches!(err, ConstraintError::DimensionMismatch(_)));
}

#[test]
fn missing_count_is_unknown_dof_type() {
    let constraints = ConstraintSet::new();
    let err = ReducedSolutionSpace::new(
        &[displacements()],
        single_count(temperature(), 3),
        &constraints,
    )
    .unwrap_err();

    assert!(matches!(err, ConstraintError::UnknownDofType(_)));
    assert!(err.to_string().contains("displacements"));
}

#[test]
fn two_constraints_on_one_dof_are_over_constrained() {
    let d = displacements();
    let mut constraints = ConstraintSet::new();
    constraints
        .add(&d, Equation::fixed(3, 0.0))
        .add(&d, Equation::prescribed(3, RhsFunction::ramp(1.0, 1.0)));

    let err = ReducedSolutionSpace::new(&[d.clone()], single_count(d, 5), &constraints).unwrap_err();
    assert!(matches!(err, ConstraintError::ConstraintTopology(_)));
    assert!(err.to_string().contains("DOF 3"));
}

#[test]
fn periodic_ties_share_one_unknown() {
    // DOFs 4 and 8 follow DOF 0; DOF 8 goes through DOF 4
    let d = displacements();
    let mut constraints = ConstraintSet::new();
    constraints.add_all(&d, [Equation::tie(4, 0), Equation::tie(8, 4)]);

    let space = ReducedSolutionSpace::new(&[d.clone()], single_count(d, 9), &constraints).unwrap();
    assert_eq!(space.num_independent_dofs(), 7);

    let mut x = DVector::zeros(7);
    x[0] = 2.5;
    let full = space.to_full(&x).unwrap();
    assert_eq!(full[0], 2.5);
    assert_eq!(full[4], 2.5);
    assert_eq!(full[8], 2.5);

    // forces on tied DOFs accumulate on the master
    let mut force = DVector::zeros(9);
    force[4] = 1.0;
    force[8] = 2.0;
    assert_eq!(space.gradient_to_reduced_basis(&force).unwrap()[0], 3.0);
}

#[test]
fn concurrent_projections_share_one_space() {
    let d = displacements();
    let mut constraints = ConstraintSet::new();
    constraints
        .add(&d, Equation::fixed(0, 0.0))
        .add(&d, Equation::prescribed(9, RhsFunction::custom(|t| 2.0 * t)));

    let space = ReducedSolutionSpace::new(&[d.clone()], single_count(d, 10), &constraints).unwrap();
    let x = DVector::from_element(8, 1.0);
    let expected = space.to_full_with_rhs(&x, 1.0).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let full = space.to_full_with_rhs(&x, 1.0).unwrap();
                    let delta = space.delta_full_rhs(0.0, 1.0).unwrap();
                    (full, delta)
                })
            })
            .collect();

        for handle in handles {
            let (full, delta) = handle.join().unwrap();
            assert_eq!(full, expected);
            assert_eq!(delta[9], 2.0);
        }
    });
}
