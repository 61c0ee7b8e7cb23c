// Sealgate — Enclave error types

use thiserror::Error;

/// Internal errors of the software sealing implementation. These never
/// cross the `SealingService` trait; they are mapped to `BoundaryStatus`
/// codes at the boundary.
#[derive(Debug, Error)]
pub enum EnclaveError {
    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Sealing failed: {0}")]
    Seal(String),

    #[error("Unsealing failed: {0}")]
    Unseal(String),

    #[error("Sealed blob too short: expected at least {expected} bytes, got {got}")]
    TruncatedBlob { expected: usize, got: usize },

    #[error("Invalid key material: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}
