// Sealgate — Top-level error types
//
// Aggregates errors from the enclave and storage layers into a single
// error enum for the application boundary. The state layer's lifecycle
// operations do not produce errors of their own: they report through
// booleans and the last-error register, and the CLI converts those into
// `Other` with the recorded boundary status.

use thiserror::Error;

/// Top-level error type for all Sealgate operations.
#[derive(Debug, Error)]
pub enum SealgateError {
    #[error("Enclave error: {0}")]
    Enclave(#[from] crate::enclave::EnclaveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SealgateError>;
