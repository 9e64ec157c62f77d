//! Error types for pool checks

/// Errors from a pool check.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A probe failed in a way that says nothing about the token itself.
    /// Carries the configuration key, never the token value.
    #[error("unclassified upstream failure for {pat}: {message}")]
    Unclassified {
        pat: String,
        message: String,
        status: Option<u16>,
    },
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
