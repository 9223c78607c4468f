//! Field storage for every stage of the pipeline
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod store;

pub mod foam;

#[doc(inline)]
pub use store::{ArrayStore, ARRAY_EXTENSION, COORDINATES};

#[doc(inline)]
pub use foam::FoamCase;

#[doc(inline)]
pub use error::{Error, Result};
