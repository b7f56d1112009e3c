//! Error types for rp-register

use std::path::PathBuf;

use crate::context::Cancellation;
use crate::retry::RetryError;
use crate::store::RemoteError;

/// Errors that can end a registration run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest failed to load or validate. Nothing was sent.
    #[error(transparent)]
    Manifest(#[from] rp_manifest::Error),

    #[error("invalid manifest file path")]
    EmptyManifestPath,

    #[error("type {type_name} not found in manifest file {path}")]
    TypeNotFound { type_name: String, path: PathBuf },

    /// A payload schema could not be encoded for the wire.
    #[error("failed to encode schema for {resource}: {source}")]
    SchemaEncoding {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    /// A remote call failed after retries were applied.
    #[error("failed to {step}: {source}")]
    Remote {
        step: String,
        #[source]
        source: RetryError<RemoteError>,
    },

    /// Registering one file of a directory failed.
    #[error("failed to register manifest file {path}: {source}")]
    ManifestFile {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The cancellation that ended the run, if any.
    pub fn cancellation(&self) -> Option<Cancellation> {
        match self {
            Error::Remote {
                source: RetryError::Cancelled(c),
                ..
            } => Some(*c),
            Error::Remote {
                source: RetryError::Operation(RemoteError::Cancelled(c)),
                ..
            } => Some(*c),
            Error::ManifestFile { source, .. } => source.cancellation(),
            _ => None,
        }
    }

    /// The status code of the remote failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { source, .. } => source.operation_error().and_then(RemoteError::status),
            Error::ManifestFile { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the run stopped because conflicts outlasted every retry.
    pub fn is_retries_exhausted(&self) -> bool {
        match self {
            Error::Remote { source, .. } => matches!(source, RetryError::Exhausted { .. }),
            Error::ManifestFile { source, .. } => source.is_retries_exhausted(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
