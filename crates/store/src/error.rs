//! Result and Error types for datafoam-store

/// Type alias for `Result<T, store::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for `datafoam-store`
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure to (de)serialise an array file
    #[error("failed binary (de)serialization")]
    FailedBinaryOp(#[from] Box<bincode::ErrorKind>),

    /// Stored or parsed data do not form a valid field
    #[error("invalid field data")]
    InvalidField(#[from] datafoam_tensor::Error),

    /// No stored array or case file for the requested field
    #[error("field \"{field}\" not found for case \"{case}\"")]
    FieldNotFound { case: String, field: String },

    /// Cell count mismatch between a field and its mesh
    #[error("field \"{field}\" has {found} cells but the mesh has {expected}")]
    MeshInconsistency {
        field: String,
        expected: usize,
        found: usize,
    },

    /// Could not find the number of cells for a case
    #[error("could not find a mesh for the case \"{0}\"")]
    MeshNotFound(String),

    /// No numeric time directories in the case
    #[error("could not find any time directory for the case \"{0}\"")]
    NoTimeDirectory(String),

    /// Only ascii field files are understood
    #[error("field \"{0}\" is not written in ascii format")]
    UnsupportedFormat(String),

    /// Generic error type for nom parser results
    #[error("failed to parse field \"{field}\": {reason}")]
    ParseError { field: String, reason: String },
}
