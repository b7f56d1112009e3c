//! Error types for rp-manifest

use std::path::PathBuf;

use crate::rules::FieldErrors;

/// Errors that can occur while loading or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The YAML document is malformed or does not match the manifest shape.
    #[error("failed to decode manifest: {0}")]
    DecodeYaml(#[from] serde_yaml::Error),

    /// The JSON document is malformed or does not match the manifest shape.
    #[error("failed to decode manifest: {0}")]
    DecodeJson(#[from] serde_json::Error),

    /// One or more fields break a naming or required-ness rule.
    #[error(transparent)]
    Invalid(#[from] FieldErrors),

    /// One or more payload schemas use unsupported shapes.
    #[error(transparent)]
    Schema(#[from] rp_schema::ValidationErrors),

    /// The manifest could not be read or parsed by the validation facade.
    #[error("failed to read manifest: {0}")]
    Read(Box<Error>),

    /// I/O error reading a manifest file.
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An empty path was given where a manifest directory is required.
    #[error("invalid manifest directory")]
    EmptyDirectoryPath,

    /// The manifest directory could not be inspected.
    #[error("failed to access manifest path {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest directory path points at something else.
    #[error("manifest path {0} is not a directory")]
    NotADirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
