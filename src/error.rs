//! use x509kit::error::X509KitError;

use thiserror::Error;

/// Represents errors that can occur in the x509kit library.
///
/// Messages are prefixed with the name of the operation that failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum X509KitError {
    /// Neither a DER nor a PEM certificate could be decoded.
    #[error("Failed to decode certificate: {0}")]
    DecodeError(String),

    /// The in-memory certificate could not be serialized.
    #[error("Failed to encode certificate: {0}")]
    EncodeError(String),

    /// A certificate chain could not be classified or fully parsed.
    #[error("Invalid certificate data: {0}")]
    FormatError(String),

    /// Signing failed (bad key, unsupported digest).
    #[error("Signing error: {0}")]
    SignError(String),

    /// Verification could not be carried out. A signature that simply
    /// does not match is not an error.
    #[error("Verification error: {0}")]
    VerifyError(String),

    /// Error due to invalid input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Error during key generation or import.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),
}

impl From<der::Error> for X509KitError {
    /// Converts a `der::Error` into a `X509KitError`.
    fn from(err: der::Error) -> Self {
        X509KitError::DecodeError(err.to_string())
    }
}

impl From<rsa::Error> for X509KitError {
    fn from(err: rsa::Error) -> Self {
        X509KitError::KeyGenerationError(err.to_string())
    }
}

impl From<pkcs8::Error> for X509KitError {
    fn from(err: pkcs8::Error) -> Self {
        X509KitError::KeyGenerationError(err.to_string())
    }
}
