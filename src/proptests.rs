//! Property-based tests for the arithmetic and matrix engine.

use crate::{ComplexError, ComplexNum, Matrix};
use approx::relative_eq;
use proptest::prelude::*;

fn component() -> impl Strategy<Value = f64> { -100.0..100.0f64 }

fn complex() -> impl Strategy<Value = ComplexNum> {
    (component(), component()).prop_map(|(re, im)| ComplexNum::new(re, im))
}

fn small_integer() -> impl Strategy<Value = ComplexNum> {
    (-9i32..=9, -3i32..=3).prop_map(|(re, im)| {
        ComplexNum::new(f64::from(re), f64::from(im))
    })
}

fn square_matrix() -> impl Strategy<Value = Matrix> {
    (1usize..=4).prop_flat_map(|n| {
        proptest::collection::vec(
            proptest::collection::vec(small_integer(), n),
            n,
        )
        .prop_map(|rows| Matrix::from_rows(rows).unwrap())
    })
}

fn augmented_matrix() -> impl Strategy<Value = Matrix> {
    (1usize..=3, 2usize..=4).prop_flat_map(|(rows, columns)| {
        proptest::collection::vec(
            proptest::collection::vec(-3i32..=3, columns),
            rows,
        )
        .prop_map(|rows| Matrix::from_rows(rows).unwrap())
    })
}

/// Did rounding noise survive the reduction, or get scaled up into a pivot?
fn has_rounding_noise(matrix: &Matrix) -> bool {
    let noisy = |x: f64| (x != 0.0 && x.abs() < 1e-6) || x.abs() > 1e6;

    matrix
        .cells()
        .any(|(_, _, value)| noisy(value.re()) || noisy(value.im()))
}

proptest! {
    #[test]
    fn adding_then_subtracting_is_a_no_op(a in complex(), b in complex()) {
        let got = a.plus(b).unwrap().minus(b).unwrap();

        prop_assert!(relative_eq!(got, a, epsilon = 1e-9));
    }

    #[test]
    fn a_number_times_its_reciprocal_is_one(a in complex()) {
        prop_assume!(a.norm_sqr() > 1e-6);

        let got = a.times(a.reciprocal().unwrap()).unwrap();

        prop_assert!(relative_eq!(got, ComplexNum::ONE, epsilon = 1e-9));
    }

    #[test]
    fn division_by_zero_never_produces_nan(a in complex()) {
        let got = a.divided_by(ComplexNum::ZERO);

        prop_assert_eq!(got, Err(ComplexError::DivisionByZero));
    }

    #[test]
    fn multiplying_by_the_inverse_gives_the_identity(m in square_matrix()) {
        let determinant = m.determinant().unwrap();
        prop_assume!(determinant.norm_sqr() > 1e-6);

        let inverse = m.inverse().unwrap().unwrap();
        let got = m.times(&inverse).unwrap();

        let identity = Matrix::identity(m.num_rows()).unwrap();
        prop_assert!(relative_eq!(got, identity, epsilon = 1e-6));
    }

    #[test]
    fn transposing_twice_is_a_no_op(m in augmented_matrix()) {
        prop_assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn determinant_is_unchanged_by_transposing(m in square_matrix()) {
        let transposed = m.transpose();

        let got = transposed.determinant().unwrap();
        let should_be = m.determinant().unwrap();

        prop_assert!(relative_eq!(got, should_be, epsilon = 1e-9));
    }

    #[test]
    fn reducing_twice_changes_nothing(m in augmented_matrix()) {
        let once = m.reduced_row_echelon().unwrap();
        prop_assume!(!has_rounding_noise(&once));

        let twice = once.reduced_row_echelon().unwrap();

        prop_assert!(relative_eq!(twice, once, epsilon = 1e-9));
    }
}
