//! Turbulent kinetic energy and the anisotropy tensors

// crate modules
use crate::error::Result;

// datafoam modules
use datafoam_tensor::Field;

// external crates
use nalgebra::Matrix3;

/// Default lower bound applied to `k` before dividing by it
pub const K_FLOOR: f64 = 1e-10;

/// TKE and anisotropy of a single cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anisotropy {
    /// Turbulent kinetic energy, `k = tr(tau)/2`
    pub k: f64,
    /// Anisotropy tensor, `a = tau - 2k/3 I`
    pub a: Matrix3<f64>,
    /// Normalised anisotropy, `b = a/2k`
    pub b: Matrix3<f64>,
}

/// Decompose a stress tensor into `k`, `a` and `b`
///
/// When `k_floor` is given, `k` is clamped to at least that value before the
/// division. Without a floor a zero TKE gives NaN in `b`.
///
/// ```rust
/// # use datafoam_closure::anisotropy;
/// # use nalgebra::Matrix3;
/// let cell = anisotropy(&Matrix3::identity(), None);
/// assert_eq!(cell.k, 1.5);
/// assert_eq!(cell.a, Matrix3::zeros());
/// ```
pub fn anisotropy(tau: &Matrix3<f64>, k_floor: Option<f64>) -> Anisotropy {
    let k = 0.5 * tau.trace();
    let a = tau - (2.0 * k / 3.0) * Matrix3::identity();
    let b = normalise(&a, k, k_floor);
    Anisotropy { k, a, b }
}

/// `a / 2k`, with `k` optionally clamped from below
pub fn normalise(a: &Matrix3<f64>, k: f64, k_floor: Option<f64>) -> Matrix3<f64> {
    let k = match k_floor {
        Some(floor) => k.max(floor),
        None => k,
    };
    a / (2.0 * k)
}

/// Field level `k`, `a` and `b` from a `[N, 3, 3]` stress tensor
pub fn k_a_b(tau: &Field, k_floor: Option<f64>) -> Result<(Field, Field, Field)> {
    let cells = tau
        .matrices()?
        .iter()
        .map(|t| anisotropy(t, k_floor))
        .collect::<Vec<Anisotropy>>();

    let k = Field::from_scalars(cells.iter().map(|c| c.k).collect());
    let a = Field::from_matrices(&cells.iter().map(|c| c.a).collect::<Vec<_>>());
    let b = Field::from_matrices(&cells.iter().map(|c| c.b).collect::<Vec<_>>());
    Ok((k, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anisotropy_is_traceless() {
        let tau = Matrix3::new(2.0, 0.3, -0.1, 0.3, 0.5, 0.2, -0.1, 0.2, 1.1);
        let cell = anisotropy(&tau, None);
        assert!((cell.k - 1.8).abs() < 1e-12);
        assert!(cell.a.trace().abs() < 1e-12);
        assert_eq!(cell.a[(0, 1)], 0.3);
    }

    #[test]
    fn zero_tke() {
        let cell = anisotropy(&Matrix3::zeros(), None);
        assert!(cell.b.iter().all(|v| v.is_nan()));

        let cell = anisotropy(&Matrix3::zeros(), Some(K_FLOOR));
        assert_eq!(cell.b, Matrix3::zeros());
    }
}
