//! Strict decoding of manifest documents.

use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::ResourceProvider;
use crate::rules;

/// Syntax of a manifest document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// JSON documents start with an object; anything else is read as YAML.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Decode and structurally validate a manifest.
///
/// Unknown fields, repeated keys and type mismatches fail decoding. A
/// document that decodes but breaks a naming rule fails with
/// [`Error::Invalid`] listing every offending field.
pub fn parse(bytes: &[u8]) -> Result<ResourceProvider> {
    let provider: ResourceProvider = match Format::detect(bytes) {
        Format::Json => serde_json::from_slice(bytes)?,
        Format::Yaml => serde_yaml::from_slice(bytes)?,
    };
    rules::validate(&provider)?;
    tracing::debug!(
        namespace = %provider.namespace,
        types = provider.types.len(),
        "parsed manifest"
    );
    Ok(provider)
}

impl FromStr for ResourceProvider {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        parse(content.as_bytes())
    }
}

impl ResourceProvider {
    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&bytes)
    }
}
