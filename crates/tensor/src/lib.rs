//! Per-cell field arrays and the tensor algebra around them
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod field;
mod kind;
mod symmetric;

pub mod basis;

#[doc(inline)]
pub use field::{Field, BASIS_SIZE};

#[doc(inline)]
pub use kind::{classify, FieldKind, SymmetricNames};

#[doc(inline)]
pub use symmetric::{
    expand_components, expand_symmetric, flatten_components, flatten_symmetric, SYMMETRIC_INDICES,
    SYMMETRIC_SIZE,
};

#[doc(inline)]
pub use error::{Error, Result};
