//! Resource provider manifests for the rpreg tool.
//!
//! A manifest declares a provider namespace, its resource types and each
//! type's API versions with their payload schemas. This crate decodes
//! manifests strictly, applies the structural naming rules and checks schema
//! legality, so that nothing reaches the control plane before the whole
//! document is known to be valid.

pub mod error;
pub mod facade;
pub mod model;
pub mod parse;
pub mod rules;
pub mod schemas;

pub use error::{Error, Result};
pub use facade::{manifest_files, validate_manifest};
pub use model::{DEFAULT_LOCATION, Location, ResourceProvider, ResourceType, ResourceTypeApiVersion};
pub use parse::{Format, parse};
pub use rules::{FieldError, FieldErrors, Rule};
pub use schemas::validate_schemas;
