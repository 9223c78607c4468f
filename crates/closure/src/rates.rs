//! Strain and rotation rate tensors from the velocity gradient

// crate modules
use crate::error::Result;

// datafoam modules
use datafoam_tensor::Field;

// external crates
use nalgebra::Matrix3;

/// Sign applied to the skew part of the velocity gradient
///
/// The solver writes `grad(U)` as the transpose of the Jacobian, so the
/// rotation rate built from it carries a negative sign. Flipping this
/// changes the physical meaning of every rotation-dependent quantity.
pub const ROTATION_SIGN: f64 = -1.0;

/// Strain rate, `S = (G + G^T)/2`
pub fn strain_rate(grad_u: &Matrix3<f64>) -> Matrix3<f64> {
    0.5 * (grad_u + grad_u.transpose())
}

/// Rotation rate, `R = ROTATION_SIGN (G - G^T)/2`
pub fn rotation_rate(grad_u: &Matrix3<f64>) -> Matrix3<f64> {
    ROTATION_SIGN * 0.5 * (grad_u - grad_u.transpose())
}

/// Field level `S` and `R` from a `[N, 3, 3]` velocity gradient
pub fn strain_rotation(grad_u: &Field) -> Result<(Field, Field)> {
    let g = grad_u.matrices()?;
    let s = g.iter().map(strain_rate).collect::<Vec<_>>();
    let r = g.iter().map(rotation_rate).collect::<Vec<_>>();
    Ok((Field::from_matrices(&s), Field::from_matrices(&r)))
}

/// Scale a tensor field by the turbulent time scale `nut/k`
///
/// Used for the non-dimensional `Shat` and `Rhat`. `k` is clamped to at least
/// `k_floor`.
pub fn non_dimensional(tensor: &Field, nut: &Field, k: &Field, k_floor: f64) -> Result<Field> {
    let n_cells = tensor.n_cells();
    nut.ensure_cells(n_cells)?;
    k.ensure_cells(n_cells)?;

    let scaled = tensor
        .matrices()?
        .iter()
        .zip(nut.scalars()?.iter().zip(k.scalars()?))
        .map(|(t, (nut, k))| t * (nut / k.max(k_floor)))
        .collect::<Vec<_>>();

    Ok(Field::from_matrices(&scaled))
}
