//! Result and Error types for datafoam-tensor

/// Type alias for `Result<T, tensor::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-tensor`
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    /// Fields are only ever rank 1 to 4
    #[error("unsupported field rank {0} (expected 1 to 4)")]
    InvalidRank(usize),

    /// Payload length does not agree with the declared shape
    #[error("payload of {found} values does not fit shape {shape:?}")]
    InvalidShape { shape: Vec<usize>, found: usize },

    /// An accessor required a specific per-cell layout
    #[error("expected a {expected} field, found shape {found:?}")]
    UnexpectedShape {
        expected: &'static str,
        found: Vec<usize>,
    },

    /// Shape that none of the field kinds can represent
    #[error("shape {0:?} does not correspond to any known field kind")]
    UnsupportedShape(Vec<usize>),

    /// Cell count mismatch between fields expected to share a mesh
    #[error("inconsistent number of cells (expected {expected}, found {found})")]
    MeshInconsistency { expected: usize, found: usize },
}
