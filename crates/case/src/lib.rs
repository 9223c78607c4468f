//! Case types and whole-case extraction
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod case_type;
mod error;
mod materialize;

#[doc(inline)]
pub use case_type::{basis_names, invariant_names, CaseType, N_INVARIANTS, N_LAMBDA, N_Q};

#[doc(inline)]
pub use materialize::{materialize, stack_features, Materialized};

#[doc(inline)]
pub use error::{Error, Result};
