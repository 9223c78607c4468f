//! Store driven derived field calculations
//!
//! Each job loads its named inputs for one case prefix, checks they share a
//! mesh, runs the pure calculation, and saves the outputs back under the same
//! prefix. Output names are fixed so that later stages can find them.
//!
//! | Job                               | Outputs                                       |
//! | --------------------------------- | --------------------------------------------- |
//! | [calc_k_b_a()]                    | `k`, `a`, `b`                                 |
//! | [calc_strain_rotation()]          | `S`, `R`                                      |
//! | [calc_eddy_viscosity()]           | `nut_{nnls,ls}`, `aperp_{..}`, `r2_{..}`      |
//! | [calc_prescribed_eddy_viscosity()]| `nut_nnls`, `aperp_nnls`, `bperp_nnls`        |
//! | [calc_basis_regression()]         | `g_basis`, `bperp_pred`, `bperp_resid`, ...   |
//! | [calc_calibration_ratio()]        | `gamma`                                       |
//! | [calc_basis_tensors()]            | `Shat`, `Rhat`, `Tensors`, `lambda`           |
//! | [calc_invariants()]               | `I1`, `I2`                                    |

// crate modules
use crate::anisotropy::{k_a_b, K_FLOOR};
use crate::calibration::calibration_ratio;
use crate::eddy::{fit_eddy_viscosity, prescribed_eddy_viscosity, FitOptions};
use crate::error::{Error, Result};
use crate::rates::{non_dimensional, strain_rotation};
use crate::ridge::{fit_basis, BasisRegression};

// datafoam modules
use datafoam_store::ArrayStore;
use datafoam_tensor::basis::{antisymmetric_field, basis_field, invariant_fields, lambda_field};
use datafoam_tensor::Field;

// external crates
use log::{info, warn};

/// Names of the inputs shared by the eddy viscosity jobs
///
/// Resolved fields use the plain names, while time-averaged LES fields carry
/// a `Mean` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureInputs {
    /// Strain rate
    pub s: String,
    /// Anisotropy
    pub a: String,
    /// Turbulent kinetic energy
    pub k: String,
}

impl Default for ClosureInputs {
    fn default() -> Self {
        Self {
            s: "S".into(),
            a: "a".into(),
            k: "k".into(),
        }
    }
}

impl ClosureInputs {
    /// Time-averaged names used by LES cases
    pub fn les() -> Self {
        Self {
            s: "SMean".into(),
            a: "aMean".into(),
            k: "kMean".into(),
        }
    }
}

/// Names of the inputs to the basis tensor and invariant jobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisInputs {
    pub s: String,
    pub r: String,
    pub nut: String,
    pub k: String,
    /// Normalised pressure gradient, as a vector or antisymmetric tensor
    pub ap: String,
    /// Normalised TKE gradient, as a vector or antisymmetric tensor
    pub ak: String,
}

impl Default for BasisInputs {
    fn default() -> Self {
        Self {
            s: "S".into(),
            r: "R".into(),
            nut: "nut".into(),
            k: "k".into(),
            ap: "Aphat".into(),
            ak: "Akhat".into(),
        }
    }
}

/// `k`, `a` and `b` from a stress tensor
pub fn calc_k_b_a(store: &ArrayStore, prefix: &str, tau: &str, k_floor: Option<f64>) -> Result<()> {
    info!("Calculating k, a and b for {prefix}");
    let tau = store.load(prefix, tau)?;
    let (k, a, b) = k_a_b(&tau, k_floor)?;
    save_all(store, prefix, &[("k", &k), ("a", &a), ("b", &b)])
}

/// `S` and `R` from a velocity gradient
pub fn calc_strain_rotation(store: &ArrayStore, prefix: &str, grad_u: &str) -> Result<()> {
    info!("Calculating S and R for {prefix}");
    let grad_u = store.load(prefix, grad_u)?;
    let (s, r) = strain_rotation(&grad_u)?;
    save_all(store, prefix, &[("S", &s), ("R", &r)])
}

/// Optimal eddy viscosity, its fit quality, and the residual anisotropy
pub fn calc_eddy_viscosity(
    store: &ArrayStore,
    prefix: &str,
    inputs: &ClosureInputs,
    options: &FitOptions,
) -> Result<()> {
    let suffix = options.constraint.suffix();
    info!("Calculating {suffix} nut and aperp for {prefix}");

    let s = store.load(prefix, &inputs.s)?;
    let a = load_matching(store, prefix, &inputs.a, s.n_cells())?;
    let fit = fit_eddy_viscosity(&s, &a, options)?;

    let names = ["nut", "aperp", "r2"].map(|n| format!("{n}_{suffix}"));
    save_all(
        store,
        prefix,
        &[
            (names[0].as_str(), &fit.nut),
            (names[1].as_str(), &fit.aperp),
            (names[2].as_str(), &fit.r2),
        ],
    )
}

/// Residual anisotropy using the eddy viscosity of a baseline case
///
/// The baseline `nut` is saved as `nut_nnls` in place of a fitted value so
/// that downstream consumers need not care which variant produced it.
pub fn calc_prescribed_eddy_viscosity(
    store: &ArrayStore,
    prefix: &str,
    coarse_store: &ArrayStore,
    coarse_prefix: &str,
    inputs: &ClosureInputs,
    k_floor: f64,
) -> Result<()> {
    info!("Calculating prescribed nut and aperp for {prefix} from {coarse_prefix}");

    let s = store.load(prefix, &inputs.s)?;
    let n_cells = s.n_cells();
    let a = load_matching(store, prefix, &inputs.a, n_cells)?;
    let k = load_matching(store, prefix, &inputs.k, n_cells)?;
    let nut = load_matching(coarse_store, coarse_prefix, "nut", n_cells)?;

    let result = prescribed_eddy_viscosity(&s, &a, &k, &nut, k_floor)?;
    save_all(
        store,
        prefix,
        &[
            ("nut_nnls", &nut),
            ("aperp_nnls", &result.aperp),
            ("bperp_nnls", &result.bperp),
        ],
    )
}

/// Ridge regression of `bperp` onto the basis tensors T2..T10
pub fn calc_basis_regression(
    store: &ArrayStore,
    prefix: &str,
    basis: &str,
    bperp: &str,
    options: &BasisRegression,
) -> Result<()> {
    info!("Calculating basis coefficients for {prefix} (alpha={})", options.alpha);

    let basis = store.load(prefix, basis)?;
    let bperp = load_matching(store, prefix, bperp, basis.n_cells())?;
    let fit = fit_basis(&basis, &bperp, options)?;

    save_all(
        store,
        prefix,
        &[
            ("g_basis", &fit.g),
            ("bperp_pred", &fit.prediction),
            ("bperp_resid", &fit.residual),
            ("bperp_resid_norm", &fit.norm),
            ("bperp_resid_rel", &fit.relative),
        ],
    )
}

/// Log-ratio of a reference and a baseline eddy viscosity, saved as `gamma`
///
/// Both fields must live on the same mesh, so the reference is usually one
/// that has already been mapped onto the baseline coordinates. The label is
/// saved alongside the reference fields.
pub fn calc_calibration_ratio(
    fine_store: &ArrayStore,
    fine_prefix: &str,
    fine_nut: &str,
    coarse_store: &ArrayStore,
    coarse_prefix: &str,
    coarse_nut: &str,
) -> Result<()> {
    info!("Calculating gamma for {fine_prefix} against {coarse_prefix}");

    let fine = fine_store.load(fine_prefix, fine_nut)?;
    let coarse = load_matching(coarse_store, coarse_prefix, coarse_nut, fine.n_cells())?;
    let gamma = calibration_ratio(&fine, &coarse)?;
    save_all(fine_store, fine_prefix, &[("gamma", &gamma)])
}

/// Non-dimensional rates, the T1..T10 stack, and lambda1..lambda5
pub fn calc_basis_tensors(
    store: &ArrayStore,
    prefix: &str,
    inputs: &BasisInputs,
    k_floor: Option<f64>,
) -> Result<()> {
    info!("Calculating basis tensors for {prefix}");
    let k_floor = k_floor.unwrap_or(K_FLOOR);

    let s = store.load(prefix, &inputs.s)?;
    let n_cells = s.n_cells();
    let r = load_matching(store, prefix, &inputs.r, n_cells)?;
    let nut = load_matching(store, prefix, &inputs.nut, n_cells)?;
    let k = load_matching(store, prefix, &inputs.k, n_cells)?;

    let shat = non_dimensional(&s, &nut, &k, k_floor)?;
    let rhat = non_dimensional(&r, &nut, &k, k_floor)?;
    let tensors = basis_field(&shat, &rhat)?;
    let lambda = lambda_field(&shat, &rhat)?;

    save_all(
        store,
        prefix,
        &[
            ("Shat", &shat),
            ("Rhat", &rhat),
            ("Tensors", &tensors),
            ("lambda", &lambda),
        ],
    )
}

/// Integrity basis invariants `I1` and `I2` from the saved `Shat`/`Rhat`
pub fn calc_invariants(store: &ArrayStore, prefix: &str, inputs: &BasisInputs) -> Result<()> {
    info!("Calculating integrity basis invariants for {prefix}");

    let shat = store.load(prefix, "Shat")?;
    let n_cells = shat.n_cells();
    let rhat = load_matching(store, prefix, "Rhat", n_cells)?;
    let ap = antisymmetric(load_matching(store, prefix, &inputs.ap, n_cells)?)?;
    let ak = antisymmetric(load_matching(store, prefix, &inputs.ak, n_cells)?)?;

    let (i1, i2) = invariant_fields(&shat, &rhat, &ap, &ak)?;
    save_all(store, prefix, &[("I1", &i1), ("I2", &i2)])
}

/// Gradient vectors are converted, tensors are used as they are
fn antisymmetric(field: Field) -> Result<Field> {
    match field.shape() {
        [_, 3] => Ok(antisymmetric_field(&field)?),
        _ => Ok(field),
    }
}

/// Load a field and check it lives on a mesh of `n_cells`
fn load_matching(store: &ArrayStore, prefix: &str, name: &str, n_cells: usize) -> Result<Field> {
    let field = store.load(prefix, name)?;
    if field.n_cells() != n_cells {
        return Err(Error::MeshInconsistency {
            field: format!("{prefix}_{name}"),
            expected: n_cells,
            found: field.n_cells(),
        });
    }
    Ok(field)
}

/// Save every output, warning about any NaN values
fn save_all(store: &ArrayStore, prefix: &str, outputs: &[(&str, &Field)]) -> Result<()> {
    for (name, field) in outputs {
        let n_nan = field.count_nan();
        if n_nan > 0 {
            warn!("{prefix}_{name} contains {n_nan} NaN values");
        }
        info!("Saving {name}");
        store.save(prefix, name, field)?;
    }
    Ok(())
}
