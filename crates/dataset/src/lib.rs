//! Tabular datasets for training closure models
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod assemble;
mod columns;
mod error;
mod table;

#[doc(inline)]
pub use assemble::{Assembler, Fingerprint, Source, FINGERPRINT_DECIMALS};

#[doc(inline)]
pub use columns::{column_layout, flatten, Column};

#[doc(inline)]
pub use table::{TabularDataset, CASE_COLUMN};

#[doc(inline)]
pub use error::{Error, Result};
