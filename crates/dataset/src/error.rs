//! Result and Error types for datafoam-dataset

/// Type alias for `Result<T, dataset::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-dataset`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failure to load a field, including missing fields
    #[error("field storage failed")]
    StoreError(#[from] datafoam_store::Error),

    /// Field whose shape can not be flattened into columns
    #[error("invalid field data")]
    InvalidField(#[from] datafoam_tensor::Error),

    /// Row count mismatch between fields of the same case
    #[error("{case}: field \"{field}\" has {found} rows, expected {expected}")]
    MeshInconsistency {
        case: String,
        field: String,
        expected: usize,
        found: usize,
    },

    /// Sources disagree on the cell centres of a case
    #[error("{case}: coordinates of source \"{source_id}\" do not match the other sources")]
    CoordinateMismatch { case: String, source_id: String },

    /// A case produced different columns to the cases before it
    #[error("{case}: columns differ from the previous cases")]
    ColumnMismatch { case: String },

    /// Failure writing delimited output
    #[error("failed to write csv")]
    FailedCsv(#[from] csv::Error),

    /// General file I/O
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),
}
