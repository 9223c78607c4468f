//! Errors for the command line pipeline

/// Type alias for `Result<T, Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// Any failure of a pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read pipeline description")]
    IOError(#[from] std::io::Error),

    #[error("invalid pipeline description")]
    FailedJson(#[from] serde_json::Error),

    #[error("case extraction failed")]
    CaseError(#[from] datafoam::case::Error),

    #[error("derived field calculation failed")]
    ClosureError(#[from] datafoam::closure::Error),

    #[error("field mapping failed")]
    MappingError(#[from] datafoam::mapping::Error),

    #[error("dataset assembly failed")]
    DatasetError(#[from] datafoam::dataset::Error),

    #[error("failed to read case directory")]
    StoreError(#[from] datafoam::store::Error),
}
