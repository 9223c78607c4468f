//! Optimal eddy viscosity fits and the residual anisotropy
//!
//! For each cell the linear eddy viscosity model `a = -2 nut S` is fitted to
//! the reference anisotropy, treating the six independent components of the
//! symmetric tensors as samples of a one-dimensional regression through the
//! origin. What the model cannot explain is the residual anisotropy,
//!
//! ```text
//! a_perp = a + 2 nut S
//! ```
//!
//! which holds by construction for whichever `nut` is used.

// crate modules
use crate::anisotropy::normalise;
use crate::error::Result;
use crate::execution::Execution;

// datafoam modules
use datafoam_tensor::Field;

// external crates
use nalgebra::Matrix3;

/// Row-major indices of a 3x3 tensor used as fit samples
///
/// The lower triangle duplicates (3, 6, 7) are dropped, leaving the
/// `xx, xy, xz, yy, yz, zz` components.
pub const FIT_INDICES: [usize; 6] = [0, 1, 2, 4, 5, 8];

/// Sign constraint on the fitted eddy viscosity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Non-negative least squares, `nut >= 0`
    #[default]
    NonNegative,
    /// Ordinary least squares, `nut` may be negative
    Unconstrained,
}

impl Constraint {
    /// Suffix used to name the output fields
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::NonNegative => "nnls",
            Self::Unconstrained => "ls",
        }
    }
}

/// Options for the field level fit
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Sign constraint on `nut`
    pub constraint: Constraint,
    /// Serial or parallel per-cell loop
    pub execution: Execution,
    /// Display a progress bar
    pub progress: bool,
}

/// Fitted eddy viscosity for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFit {
    pub nut: f64,
    pub r2: f64,
}

/// Result of a field level fit
#[derive(Debug, Clone, PartialEq)]
pub struct EddyViscosity {
    /// Fitted eddy viscosity, `[N]`
    pub nut: Field,
    /// Coefficient of determination of each fit, `[N]`
    pub r2: Field,
    /// Residual anisotropy, `[N, 3, 3]`
    pub aperp: Field,
}

/// Result of using a prescribed eddy viscosity
#[derive(Debug, Clone, PartialEq)]
pub struct Prescribed {
    /// Residual anisotropy, `[N, 3, 3]`
    pub aperp: Field,
    /// Residual anisotropy normalised by `2k`, `[N, 3, 3]`
    pub bperp: Field,
}

/// Fit `a = -2 nut S` for a single cell
///
/// With `X = -2 S` and `y = a` over [FIT_INDICES], the least squares slope
/// through the origin is `X.y / X.X`. The non-negative fit clamps this at zero,
/// which is the exact solution of the one-dimensional constrained problem. A
/// vanishing strain rate gives `nut = 0`.
///
/// ```rust
/// # use datafoam_closure::{fit_cell, Constraint};
/// # use nalgebra::Matrix3;
/// let s = Matrix3::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
/// let a = -2.0 * 0.3 * s;
/// let fit = fit_cell(&s, &a, Constraint::NonNegative);
/// assert!((fit.nut - 0.3).abs() < 1e-12);
/// assert!((fit.r2 - 1.0).abs() < 1e-12);
/// ```
pub fn fit_cell(s: &Matrix3<f64>, a: &Matrix3<f64>, constraint: Constraint) -> CellFit {
    let x = FIT_INDICES.map(|i| -2.0 * row_major(s, i));
    let y = FIT_INDICES.map(|i| row_major(a, i));

    let xx = x.iter().map(|v| v * v).sum::<f64>();
    let xy = x.iter().zip(&y).map(|(u, v)| u * v).sum::<f64>();

    let slope = if xx == 0.0 { 0.0 } else { xy / xx };
    let nut = match constraint {
        Constraint::NonNegative => slope.max(0.0),
        Constraint::Unconstrained => slope,
    };

    let prediction = x.map(|v| v * nut);
    CellFit {
        nut,
        r2: r2_score(&y, &prediction),
    }
}

/// Coefficient of determination, `1 - SS_res/SS_tot`
///
/// A constant target gives 1 for a perfect prediction and 0 otherwise.
pub fn r2_score(target: &[f64], prediction: &[f64]) -> f64 {
    let mean = target.iter().sum::<f64>() / target.len() as f64;
    let ss_res = target
        .iter()
        .zip(prediction)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>();
    let ss_tot = target.iter().map(|y| (y - mean).powi(2)).sum::<f64>();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Residual anisotropy, `a + 2 nut S`
pub fn perpendicular(a: &Matrix3<f64>, s: &Matrix3<f64>, nut: f64) -> Matrix3<f64> {
    a + 2.0 * nut * s
}

/// Fit the eddy viscosity for every cell of a case
pub fn fit_eddy_viscosity(s: &Field, a: &Field, options: &FitOptions) -> Result<EddyViscosity> {
    a.ensure_cells(s.n_cells())?;
    let (s, a) = (s.matrices()?, a.matrices()?);

    let fits = options
        .execution
        .map_cells(s.len(), options.progress, |i| {
            Ok(fit_cell(&s[i], &a[i], options.constraint))
        })?;

    let aperp = fits
        .iter()
        .enumerate()
        .map(|(i, fit)| perpendicular(&a[i], &s[i], fit.nut))
        .collect::<Vec<_>>();

    Ok(EddyViscosity {
        nut: Field::from_scalars(fits.iter().map(|f| f.nut).collect()),
        r2: Field::from_scalars(fits.iter().map(|f| f.r2).collect()),
        aperp: Field::from_matrices(&aperp),
    })
}

/// Residual anisotropy under an externally supplied eddy viscosity
///
/// Typically `nut` comes from the baseline model, measuring how much of the
/// reference anisotropy remains even with the ideal baseline coefficient.
pub fn prescribed_eddy_viscosity(
    s: &Field,
    a: &Field,
    k: &Field,
    nut: &Field,
    k_floor: f64,
) -> Result<Prescribed> {
    let n_cells = s.n_cells();
    for field in [a, k, nut] {
        field.ensure_cells(n_cells)?;
    }

    let (s, a) = (s.matrices()?, a.matrices()?);
    let (k, nut) = (k.scalars()?, nut.scalars()?);

    let aperp = (0..n_cells)
        .map(|i| perpendicular(&a[i], &s[i], nut[i]))
        .collect::<Vec<_>>();
    let bperp = aperp
        .iter()
        .zip(k)
        .map(|(ap, k)| normalise(ap, *k, Some(k_floor)))
        .collect::<Vec<_>>();

    Ok(Prescribed {
        aperp: Field::from_matrices(&aperp),
        bperp: Field::from_matrices(&bperp),
    })
}

/// Value at a row-major flat index
fn row_major(m: &Matrix3<f64>, index: usize) -> f64 {
    m[(index / 3, index % 3)]
}
