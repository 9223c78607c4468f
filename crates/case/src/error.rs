//! Result and Error types for datafoam-case

/// Type alias for `Result<T, case::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-case`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failure to read a case field or save an array, including missing fields
    #[error("field storage failed")]
    StoreError(#[from] datafoam_store::Error),

    /// Fields that could not be stacked
    #[error("invalid field data")]
    InvalidField(#[from] datafoam_tensor::Error),

    /// A field does not have one value per cell centre
    #[error("{case}: field \"{field}\" has {found} cells, expected {expected}")]
    MeshInconsistency {
        case: String,
        field: String,
        expected: usize,
        found: usize,
    },

    /// Case type names are a closed set
    #[error("unknown case type \"{0}\" (expected kepsilonphitf, komegasst, les, or dns)")]
    UnknownCaseType(String),
}
