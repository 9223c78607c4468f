//! Derived turbulence quantities for closure modelling
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod anisotropy;
mod calibration;
mod eddy;
mod error;
mod execution;
mod rates;
mod ridge;

pub mod jobs;

#[doc(inline)]
pub use anisotropy::{anisotropy, k_a_b, normalise, Anisotropy, K_FLOOR};

#[doc(inline)]
pub use rates::{non_dimensional, rotation_rate, strain_rate, strain_rotation, ROTATION_SIGN};

#[doc(inline)]
pub use eddy::{
    fit_cell, fit_eddy_viscosity, perpendicular, prescribed_eddy_viscosity, r2_score, CellFit,
    Constraint, EddyViscosity, FitOptions, Prescribed, FIT_INDICES,
};

#[doc(inline)]
pub use ridge::{
    fit_basis, fit_basis_cell, BasisFit, BasisRegression, CellBasisFit, N_COEFFICIENTS,
    RELATIVE_FLOOR,
};

#[doc(inline)]
pub use calibration::{calibration_ratio, CALIBRATION_FLOOR};

#[doc(inline)]
pub use execution::{Execution, THREADS_HINT};

#[doc(inline)]
pub use error::{Error, Result};
