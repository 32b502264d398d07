//! Error types for the card engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the card engine
///
/// Every variant is recoverable: nothing in this crate is allowed to leave a
/// component with a stuck busy flag or a dangling selection, and callers can
/// always retry the failed operation with a fresh call.
#[derive(Error, Debug)]
pub enum Error {
    /// A record violated the non-empty-field invariant
    #[error("Invalid record: {0}")]
    Validation(String),

    /// Store query failed or returned malformed data
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Raster capture or PNG encoding failed
    #[error("Export failed: {0}")]
    Export(String),

    /// Share link or QR payload derivation failed
    #[error("Share derivation failed: {0}")]
    Share(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "http-store")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Retrieval(err.to_string())
    }
}
