//! Closure basis tensors and their scalar invariants
//!
//! Everything here is built from the non-dimensional strain rate `Shat` and
//! rotation rate `Rhat`, plus (for the integrity basis) the normalised
//! antisymmetric tensors of the pressure and TKE gradients, `Aphat`/`Akhat`.
//!
//! - [pope_basis()] gives the ten tensors T1..T10 of Pope (1975)
//! - [pope_invariants()] gives the five scalars lambda1..lambda5
//! - [integrity_basis()] gives the 47 products B1..B47 of Wu et al. (2018),
//!   reduced to the invariant pairs I1_i/I2_i by [invariant_pair()]
//!
//! All of these are frame-invariant, i.e. rotating every input by `Q` leaves
//! the invariants unchanged and rotates each basis tensor as `Q T Q^T`.

// crate modules
use crate::error::Result;
use crate::field::{Field, BASIS_SIZE};

// external crates
use nalgebra::{Matrix3, Vector3};

/// Number of tensors in the integrity basis
pub const INTEGRITY_SIZE: usize = 47;

/// Number of Pope scalar invariants
pub const LAMBDA_SIZE: usize = 5;

/// Integrity basis products, written left to right
///
/// `S`=Shat, `R`=Rhat, `P`=Aphat, `K`=Akhat
const INTEGRITY_WORDS: [&str; INTEGRITY_SIZE] = [
    "SS", "SSS", "RR", "PP", "KK", "RRS", "RRSS", "RRSRSS", "PPS", "PPSS", "PPSPSS", "KKS",
    "KKSS", "KKSKSS", "RP", "PK", "RK", "RPS", "RPSS", "RRPS", "PPRS", "RRPSS", "PPRSS",
    "RRSPSS", "PPSRSS", "RKS", "RKSS", "RRKS", "KKRS", "RRKSS", "KKRSS", "RRSKSS", "KKSRSS",
    "PKS", "PKSS", "PPKS", "KKPS", "PPKSS", "KKPSS", "PPSKSS", "KKSPSS", "RPK", "RPKS", "RKPS",
    "RPKSS", "RKPSS", "RPSKSS",
];

/// Antisymmetric tensor associated with a gradient vector
///
/// ```text
/// |  0  -vz  vy |
/// |  vz  0  -vx |
/// | -vy  vx  0  |
/// ```
pub fn antisymmetric_of(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// The ten basis tensors T1..T10 for a single cell
pub fn pope_basis(s: &Matrix3<f64>, r: &Matrix3<f64>) -> [Matrix3<f64>; BASIS_SIZE] {
    let i = Matrix3::identity();
    let ss = s * s;
    let rr = r * r;
    let third = 1.0 / 3.0;
    let two_thirds = 2.0 / 3.0;

    [
        *s,
        s * r - r * s,
        ss - third * ss.trace() * i,
        rr - third * rr.trace() * i,
        r * ss - ss * r,
        rr * s + s * rr - two_thirds * (s * rr).trace() * i,
        r * s * rr - rr * s * r,
        s * r * ss - ss * r * s,
        rr * ss + ss * rr - two_thirds * (ss * rr).trace() * i,
        r * ss * rr - rr * ss * r,
    ]
}

/// The scalar invariants lambda1..lambda5 for a single cell
pub fn pope_invariants(s: &Matrix3<f64>, r: &Matrix3<f64>) -> [f64; LAMBDA_SIZE] {
    let ss = s * s;
    let rr = r * r;
    [
        ss.trace(),
        rr.trace(),
        (ss * s).trace(),
        (rr * s).trace(),
        (rr * ss).trace(),
    ]
}

/// The 47 integrity basis products B1..B47 for a single cell
pub fn integrity_basis(
    s: &Matrix3<f64>,
    r: &Matrix3<f64>,
    p: &Matrix3<f64>,
    k: &Matrix3<f64>,
) -> [Matrix3<f64>; INTEGRITY_SIZE] {
    std::array::from_fn(|n| {
        INTEGRITY_WORDS[n]
            .chars()
            .fold(Matrix3::identity(), |acc, c| match c {
                'S' => acc * s,
                'R' => acc * r,
                'P' => acc * p,
                _ => acc * k,
            })
    })
}

/// First and second principal invariants of a tensor
///
/// `I1 = tr(B)` and `I2 = 0.5 * (tr(B)^2 - tr(B.B))`
pub fn invariant_pair(b: &Matrix3<f64>) -> (f64, f64) {
    let trace = b.trace();
    (trace, 0.5 * (trace * trace - (b * b).trace()))
}

/// Stacked `[N, 10, 3, 3]` basis tensor field
pub fn basis_field(shat: &Field, rhat: &Field) -> Result<Field> {
    rhat.ensure_cells(shat.n_cells())?;
    let basis = shat
        .matrices()?
        .iter()
        .zip(rhat.matrices()?.iter())
        .map(|(s, r)| pope_basis(s, r))
        .collect::<Vec<_>>();
    Ok(Field::from_basis(&basis))
}

/// Stacked `[N, 5]` field of lambda1..lambda5
pub fn lambda_field(shat: &Field, rhat: &Field) -> Result<Field> {
    rhat.ensure_cells(shat.n_cells())?;
    let data = shat
        .matrices()?
        .iter()
        .zip(rhat.matrices()?.iter())
        .flat_map(|(s, r)| pope_invariants(s, r))
        .collect();
    Field::new(vec![shat.n_cells(), LAMBDA_SIZE], data)
}

/// `[N, 3, 3]` antisymmetric field from a `[N, 3]` gradient field
pub fn antisymmetric_field(gradient: &Field) -> Result<Field> {
    let tensors = gradient
        .vectors()?
        .iter()
        .map(antisymmetric_of)
        .collect::<Vec<_>>();
    Ok(Field::from_matrices(&tensors))
}

/// The `[N, 47]` invariant stacks I1 and I2
pub fn invariant_fields(
    shat: &Field,
    rhat: &Field,
    aphat: &Field,
    akhat: &Field,
) -> Result<(Field, Field)> {
    let n_cells = shat.n_cells();
    for field in [rhat, aphat, akhat] {
        field.ensure_cells(n_cells)?;
    }

    let (s, r) = (shat.matrices()?, rhat.matrices()?);
    let (p, k) = (aphat.matrices()?, akhat.matrices()?);

    let mut i1 = Vec::with_capacity(n_cells * INTEGRITY_SIZE);
    let mut i2 = Vec::with_capacity(n_cells * INTEGRITY_SIZE);
    for cell in 0..n_cells {
        for b in integrity_basis(&s[cell], &r[cell], &p[cell], &k[cell]) {
            let (first, second) = invariant_pair(&b);
            i1.push(first);
            i2.push(second);
        }
    }

    Ok((
        Field::new(vec![n_cells, INTEGRITY_SIZE], i1)?,
        Field::new(vec![n_cells, INTEGRITY_SIZE], i2)?,
    ))
}
