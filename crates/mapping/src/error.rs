//! Result and Error types for datafoam-mapping

/// Type alias for `Result<T, mapping::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-mapping`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failure to load or save a field
    #[error("field storage failed")]
    StoreError(#[from] datafoam_store::Error),

    /// Field data with the wrong layout for mapping
    #[error("invalid field data")]
    InvalidField(#[from] datafoam_tensor::Error),

    /// Field does not live on the mesh the mapping was built for
    #[error("field \"{field}\" has {found} cells, expected {expected}")]
    MeshInconsistency {
        field: String,
        expected: usize,
        found: usize,
    },

    /// Nothing to interpolate from
    #[error("source mesh has no cells")]
    EmptySource,

    /// Coordinates must be finite to be searched
    #[error("cell {cell} has a non-finite coordinate")]
    NonFiniteCoordinate { cell: usize },

    /// Plane mapping needs one of the three coordinate axes dropped
    #[error("invalid plane axis {0} (expected 0, 1, or 2)")]
    InvalidAxis(usize),

    /// Could not initialise or draw the progress bar
    #[error("progress bar failure: {0}")]
    ProgressBar(String),

    /// Failure writing the provenance record
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Provenance record could not be (de)serialised
    #[error("failed to serialise provenance record")]
    FailedJson(#[from] serde_json::Error),
}
