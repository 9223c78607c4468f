//! Ridge regression of the residual anisotropy onto the basis tensors

// crate modules
use crate::error::{Error, Result};
use crate::execution::Execution;

// datafoam modules
use datafoam_tensor::{expand_components, flatten_components, Field, BASIS_SIZE};

// external crates
use nalgebra::{Matrix3, SMatrix, SVector};

/// Number of fitted coefficients, T2..T10
pub const N_COEFFICIENTS: usize = BASIS_SIZE - 1;

/// Lower bound on `|b_perp|` when computing the relative residual
pub const RELATIVE_FLOOR: f64 = 1e-8;

type Design = SMatrix<f64, 6, N_COEFFICIENTS>;
type Normal = SMatrix<f64, N_COEFFICIENTS, N_COEFFICIENTS>;

/// Options for the basis tensor regression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisRegression {
    /// L2 regularisation strength
    pub alpha: f64,
    /// Serial or parallel per-cell loop
    pub execution: Execution,
    /// Display a progress bar
    pub progress: bool,
}

impl Default for BasisRegression {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            execution: Execution::Serial,
            progress: false,
        }
    }
}

/// Regression result for one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBasisFit {
    /// Coefficients g2..g10
    pub g: [f64; N_COEFFICIENTS],
    /// Reconstructed `b_perp`
    pub prediction: Matrix3<f64>,
    /// `b_perp - prediction`
    pub residual: Matrix3<f64>,
    /// Frobenius norm of the residual
    pub norm: f64,
    /// Residual norm relative to `|b_perp|`
    pub relative: f64,
}

/// Regression results for a whole case
#[derive(Debug, Clone, PartialEq)]
pub struct BasisFit {
    /// `[N, 9]`
    pub g: Field,
    /// `[N, 3, 3]`
    pub prediction: Field,
    /// `[N, 3, 3]`
    pub residual: Field,
    /// `[N]`
    pub norm: Field,
    /// `[N]`
    pub relative: Field,
}

/// Fit `b_perp ~ sum g_n T_n` for n = 2..10 in a single cell
///
/// The six independent components of every tensor are the samples, and the
/// coefficients solve `(X^T X + alpha I) g = X^T y` with no intercept. T1 is
/// left out as it is the direction already covered by the eddy viscosity.
pub fn fit_basis_cell(
    basis: &[Matrix3<f64>; BASIS_SIZE],
    bperp: &Matrix3<f64>,
    alpha: f64,
) -> std::result::Result<CellBasisFit, &'static str> {
    let x = Design::from_fn(|r, c| flatten_components(&basis[c + 1])[r]);
    let y = SVector::<f64, 6>::from(flatten_components(bperp));

    let lhs = x.transpose() * x + alpha * Normal::identity();
    let rhs = x.transpose() * y;

    let g = match lhs.cholesky() {
        Some(cholesky) => cholesky.solve(&rhs),
        None => lhs.svd(true, true).solve(&rhs, f64::EPSILON)?,
    };

    let prediction = expand_components((x * g).as_slice());
    let residual = bperp - prediction;
    let norm = residual.norm();

    Ok(CellBasisFit {
        g: g.into(),
        prediction,
        residual,
        norm,
        relative: norm / bperp.norm().max(RELATIVE_FLOOR),
    })
}

/// Fit the basis coefficients for every cell of a case
pub fn fit_basis(basis: &Field, bperp: &Field, options: &BasisRegression) -> Result<BasisFit> {
    bperp.ensure_cells(basis.n_cells())?;
    let (basis, bperp) = (basis.basis()?, bperp.matrices()?);

    let fits = options
        .execution
        .map_cells(basis.len(), options.progress, |cell| {
            fit_basis_cell(&basis[cell], &bperp[cell], options.alpha)
                .map_err(|reason| Error::SingularSystem { cell, reason })
        })?;

    let n_cells = fits.len();
    let g = fits.iter().flat_map(|f| f.g).collect();
    let prediction = fits.iter().map(|f| f.prediction).collect::<Vec<_>>();
    let residual = fits.iter().map(|f| f.residual).collect::<Vec<_>>();

    Ok(BasisFit {
        g: Field::new(vec![n_cells, N_COEFFICIENTS], g)?,
        prediction: Field::from_matrices(&prediction),
        residual: Field::from_matrices(&residual),
        norm: Field::from_scalars(fits.iter().map(|f| f.norm).collect()),
        relative: Field::from_scalars(fits.iter().map(|f| f.relative).collect()),
    })
}
