//! Schema legality across every type and version of a provider.

use rp_schema::{Schema, ValidationError, ValidationErrors, Validator};

use crate::model::ResourceProvider;

/// Validate every declared payload schema of `provider`.
///
/// Errors are keyed by `<namespace>/<type>@<version>` followed by the path
/// inside the schema. Versions without a schema are skipped.
pub fn validate_schemas(provider: &ResourceProvider) -> Result<(), ValidationErrors> {
    let validator = Validator::new();
    let mut errors = ValidationErrors::new();

    for (type_name, resource_type) in &provider.types {
        for (version, api_version) in &resource_type.api_versions {
            let Some(document) = &api_version.schema else {
                continue;
            };
            let path = format!("{}/{}@{}", provider.namespace, type_name, version);

            let value = match serde_json::to_value(document) {
                Ok(value) => value,
                Err(e) => {
                    errors.add(ValidationError::parse(path, format!("failed to parse schema: {e}")));
                    continue;
                }
            };

            match Schema::from_value(&value) {
                Ok(schema) => errors.extend(validator.validate(&schema).into_iter().map(|e| e.within(&path))),
                Err(e) => errors.add(e.within(&path)),
            }
        }
    }

    tracing::debug!(
        namespace = %provider.namespace,
        errors = errors.len(),
        "validated payload schemas"
    );
    errors.into_result()
}
