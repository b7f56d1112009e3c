//! Error types for rp-ucp

/// Errors raised while building a [`crate::UcpClient`].
///
/// Failures of individual calls are reported as
/// [`rp_register::RemoteError`] so the retry engine can classify them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
