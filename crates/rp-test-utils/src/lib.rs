//! Shared test utilities for the rpreg workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`]: manifest documents checked into `test-fixtures/manifests`
//! - [`dir`]: [`ManifestDir`](dir::ManifestDir), a temporary directory of manifest files

pub mod dir;
pub mod fixtures;
