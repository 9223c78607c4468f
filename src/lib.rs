//! `datafoam` turns finished OpenFOAM cases into machine-learning-ready
//! datasets for turbulence closure modelling
//!
//! The pipeline is split into feature-gated crates, re-exported here:
//!
//! | Module    | Purpose                                                    |
//! | --------- | ---------------------------------------------------------- |
//! | [tensor]  | Per-cell field arrays, symmetric encoding, classification  |
//! | [store]   | Binary array store and case directory reader               |
//! | `case`    | Case types and whole-case extraction                       |
//! | `closure` | Derived fields, eddy viscosity fits, basis regression      |
//! | `mapping` | Interpolation of fine mesh fields onto a coarse mesh       |
//! | `dataset` | Flattening and joining fields into a CSV table             |
//!
//! The `datafoam` binary drives every stage from a single JSON description.
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of pipeline crates.
#[doc(inline)]
pub use datafoam_tensor as tensor;

#[doc(inline)]
pub use datafoam_store as store;

#[cfg(feature = "case")]
#[cfg_attr(docsrs, doc(cfg(feature = "case")))]
#[doc(inline)]
pub use datafoam_case as case;

#[cfg(feature = "closure")]
#[cfg_attr(docsrs, doc(cfg(feature = "closure")))]
#[doc(inline)]
pub use datafoam_closure as closure;

#[cfg(feature = "dataset")]
#[cfg_attr(docsrs, doc(cfg(feature = "dataset")))]
#[doc(inline)]
pub use datafoam_dataset as dataset;

#[cfg(feature = "mapping")]
#[cfg_attr(docsrs, doc(cfg(feature = "mapping")))]
#[doc(inline)]
pub use datafoam_mapping as mapping;
