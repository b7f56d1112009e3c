//! Single entry point that runs every manifest check before registration.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::ResourceProvider;
use crate::schemas::validate_schemas;

/// Read, parse and fully validate the manifest at `path`.
///
/// Read, decode and rule failures are wrapped as `failed to read manifest`.
/// Schema failures are returned as [`Error::Schema`] so the caller can walk
/// the individual entries.
pub fn validate_manifest(path: impl AsRef<Path>) -> Result<ResourceProvider> {
    let path = path.as_ref();
    let provider = ResourceProvider::from_path(path).map_err(|e| Error::Read(Box::new(e)))?;
    validate_schemas(&provider)?;
    tracing::debug!(path = %path.display(), namespace = %provider.namespace, "manifest is valid");
    Ok(provider)
}

/// List the manifest files in `dir`, sorted by file name.
///
/// Every regular file is treated as a manifest; subdirectories are skipped.
pub fn manifest_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if dir.as_os_str().is_empty() {
        return Err(Error::EmptyDirectoryPath);
    }

    let access = |source| Error::DirectoryAccess {
        path: dir.to_path_buf(),
        source,
    };
    let metadata = std::fs::metadata(dir).map_err(access)?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(access)? {
        let entry = entry.map_err(access)?;
        if entry.file_type().map_err(access)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
