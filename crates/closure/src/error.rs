//! Result and Error types for datafoam-closure

/// Type alias for `Result<T, closure::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-closure`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failure to load or save a field
    #[error("field storage failed")]
    StoreError(#[from] datafoam_store::Error),

    /// Field data with the wrong layout for the calculation
    #[error("invalid field data")]
    InvalidField(#[from] datafoam_tensor::Error),

    /// Cell count mismatch between fields expected to share a mesh
    #[error("field \"{field}\" has {found} cells, expected {expected}")]
    MeshInconsistency {
        field: String,
        expected: usize,
        found: usize,
    },

    /// Could not build the worker pool
    #[error("failed to build worker pool")]
    FailedThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Could not initialise or draw the progress bar
    #[error("progress bar failure: {0}")]
    ProgressBar(String),

    /// Progress bar I/O
    #[error("failure in terminal I/O")]
    IOError(#[from] std::io::Error),

    /// Neither the Cholesky nor the SVD solve succeeded for a cell
    #[error("regression system for cell {cell} could not be solved: {reason}")]
    SingularSystem { cell: usize, reason: &'static str },
}
