//! Log-ratio label for correcting a baseline eddy viscosity

// crate modules
use crate::error::Result;

// datafoam modules
use datafoam_tensor::Field;

/// Lower bound on both eddy viscosities before taking the ratio
pub const CALIBRATION_FLOOR: f64 = 1e-8;

/// Per-cell `gamma = ln(max(fine, eps) / max(coarse, eps))`
///
/// ```rust
/// # use datafoam_closure::calibration_ratio;
/// # use datafoam_tensor::Field;
/// let fine = Field::from_scalars(vec![2.0, 0.0]);
/// let coarse = Field::from_scalars(vec![1.0, -1.0]);
/// let gamma = calibration_ratio(&fine, &coarse).unwrap();
/// assert_eq!(gamma.scalars().unwrap(), &[2f64.ln(), 0.0]);
/// ```
pub fn calibration_ratio(fine: &Field, coarse: &Field) -> Result<Field> {
    coarse.ensure_cells(fine.n_cells())?;
    let gamma = fine
        .scalars()?
        .iter()
        .zip(coarse.scalars()?)
        .map(|(f, c)| (f.max(CALIBRATION_FLOOR) / c.max(CALIBRATION_FLOOR)).ln())
        .collect();
    Ok(Field::from_scalars(gamma))
}
