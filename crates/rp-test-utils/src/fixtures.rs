//! Manifest fixtures stored under `test-fixtures/manifests`.

use std::fs;
use std::path::PathBuf;

/// One type, one preview version, one capability.
pub const VALID: &str = "valid.yaml";
/// The same provider as [`VALID`] written as JSON.
pub const VALID_JSON: &str = "valid.json";
/// A provider with an empty `types` map.
pub const EMPTY_TYPES: &str = "empty-types.yaml";
/// Two types, three versions and a custom location.
pub const MULTIPLE_TYPES: &str = "multiple-types.yaml";
/// Decodes and passes the naming rules, but uses unsupported schema shapes.
pub const INVALID_SCHEMA: &str = "invalid-schema.yaml";
/// Breaks every naming rule.
pub const INVALID_NAMES: &str = "invalid-names.yaml";
/// Declares the same type twice.
pub const DUPLICATE_KEYS: &str = "duplicate-keys.yaml";

/// Directory holding the manifest fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/manifests")
}

/// Absolute path of the fixture called `name`.
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Contents of the fixture called `name`.
///
/// # Panics
///
/// Panics when the fixture does not exist.
pub fn fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}
