//! Integration tests for encoding, classification, and frame invariance

use datafoam_tensor::basis::{
    antisymmetric_of, integrity_basis, invariant_fields, invariant_pair, pope_basis,
    pope_invariants,
};
use datafoam_tensor::{
    classify, expand_components, expand_symmetric, flatten_components, flatten_symmetric, Field,
    FieldKind, SymmetricNames,
};
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use rstest::{fixture, rstest};
use std::f64::consts::PI;

/// A representative set of cell tensors, Shat, Rhat, Aphat, Akhat
#[fixture]
fn cell() -> [Matrix3<f64>; 4] {
    let s = Matrix3::new(0.4, -0.3, 0.15, -0.3, -0.25, 0.05, 0.15, 0.05, -0.15);
    let r = antisymmetric_of(&Vector3::new(0.35, -0.2, 0.6));
    let p = antisymmetric_of(&Vector3::new(-0.15, 0.45, 0.1));
    let k = antisymmetric_of(&Vector3::new(0.25, 0.3, -0.4));
    [s, r, p, k]
}

fn rotate(m: &Matrix3<f64>, q: &Matrix3<f64>) -> Matrix3<f64> {
    q * m * q.transpose()
}

#[rstest]
#[case([1.0, 2.0, 3.0, 4.0, 5.0, 6.0])]
#[case([-1.5e-8, 0.25, 3.0e12, 0.0, -7.0, 1.0e-300])]
#[case([0.0, -0.0, f64::MAX, f64::MIN_POSITIVE, 1.0, -1.0])]
fn symmetric_round_trip(#[case] components: [f64; 6]) {
    let full = expand_components(&components);
    assert_eq!(full, full.transpose());
    assert_eq!(flatten_components(&full), components);

    let raw = Field::new(vec![1, 6], components.to_vec()).unwrap();
    let flattened = flatten_symmetric(&expand_symmetric(&raw).unwrap()).unwrap();
    assert_eq!(flattened.data(), &components);
}

#[rstest]
#[case("S", vec![4, 3, 3], FieldKind::SymmetricMatrix)]
#[case("Shat", vec![4, 3, 3], FieldKind::SymmetricMatrix)]
#[case("b", vec![4, 3, 3], FieldKind::SymmetricMatrix)]
#[case("tau", vec![4, 3, 3], FieldKind::SymmetricMatrix)]
#[case("a", vec![4, 3, 3], FieldKind::SymmetricMatrix)]
#[case("gradU", vec![4, 3, 3], FieldKind::Matrix)]
#[case("R", vec![4, 3, 3], FieldKind::Matrix)]
#[case("aperp_nnls", vec![4, 3, 3], FieldKind::Matrix)]
#[case("k", vec![4], FieldKind::Scalar)]
#[case("U", vec![4, 3], FieldKind::Vector(3))]
#[case("I1", vec![4, 47], FieldKind::Vector(47))]
#[case("Tensors", vec![4, 10, 3, 3], FieldKind::TensorBasis)]
fn classifier_is_deterministic(
    #[case] name: &str,
    #[case] shape: Vec<usize>,
    #[case] expected: FieldKind,
) {
    let len = shape.iter().product();
    let field = Field::new(shape, vec![0.0; len]).unwrap();
    assert_eq!(classify(name, &field, &SymmetricNames::default()).unwrap(), expected);
}

#[test]
fn numerically_symmetric_matrix_stays_general() {
    let field = Field::from_matrices(&[Matrix3::identity()]);
    assert_eq!(
        classify("gradU", &field, &SymmetricNames::default()).unwrap(),
        FieldKind::Matrix
    );
}

#[rstest]
#[case(Vector3::z_axis(), PI / 4.0)]
#[case(Vector3::z_axis(), PI / 2.0)]
#[case(Unit::new_normalize(Vector3::new(1.0, 1.0, 0.0)), PI / 4.0)]
#[case(Unit::new_normalize(Vector3::new(1.0, 1.0, 1.0)), 70.0_f64.to_radians())]
fn invariants_survive_rotation(
    cell: [Matrix3<f64>; 4],
    #[case] axis: Unit<Vector3<f64>>,
    #[case] angle: f64,
) {
    let q = *Rotation3::from_axis_angle(&axis, angle).matrix();
    let [s, r, p, k] = cell;
    let rotated = cell.map(|m| rotate(&m, &q));
    let [rs, rr, rp, rk] = rotated;

    // scalar invariants are unchanged
    let base = integrity_basis(&s, &r, &p, &k);
    let turned = integrity_basis(&rs, &rr, &rp, &rk);
    for (a, b) in base.iter().zip(turned.iter()) {
        let (a1, a2) = invariant_pair(a);
        let (b1, b2) = invariant_pair(b);
        assert!((a1 - b1).abs() < 1e-8);
        assert!((a2 - b2).abs() < 1e-8);
    }

    for (a, b) in pope_invariants(&s, &r)
        .iter()
        .zip(pope_invariants(&rs, &rr).iter())
    {
        assert!((a - b).abs() < 1e-8);
    }

    // basis tensors rotate with the frame
    for (t, rt) in pope_basis(&s, &r).iter().zip(pope_basis(&rs, &rr).iter()) {
        assert!((rotate(t, &q) - rt).abs().max() < 1e-8);
    }
}

#[rstest]
fn invariant_fields_match_single_cell(cell: [Matrix3<f64>; 4]) {
    let [s, r, p, k] = cell;
    let fields = cell.map(|m| Field::from_matrices(&[m, m]));
    let (i1, i2) = invariant_fields(&fields[0], &fields[1], &fields[2], &fields[3]).unwrap();
    assert_eq!(i1.shape(), &[2, 47]);
    assert_eq!(i2.shape(), &[2, 47]);

    let basis = integrity_basis(&s, &r, &p, &k);
    for (n, b) in basis.iter().enumerate() {
        let (first, second) = invariant_pair(b);
        assert_eq!(i1.cell(1)[n], first);
        assert_eq!(i2.cell(1)[n], second);
    }
}
