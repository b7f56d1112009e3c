//! Legality checks for payload schemas.
//!
//! The control plane accepts a narrow subset of JSON Schema: plain object,
//! string, integer, boolean and array nodes, internal references only, and
//! no composite keywords. [`Validator`] walks a [`Schema`] tree and reports
//! every violation it finds, keyed by the dotted path of the offending node.

use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationErrors, join_path};
use crate::node::{AdditionalProperties, ObjectSchema, Schema, SchemaKind};

/// Property that may carry free-form, unconstrained configuration.
pub const PLATFORM_OPTIONS: &str = "platformOptions";

const RESERVED_STATUS: &str = "status";
const RESERVED_RECIPE: &str = "recipe";
const RESERVED_APPLICATION: &str = "application";
const RESERVED_ENVIRONMENT: &str = "environment";
const RESERVED_CONNECTIONS: &str = "connections";

const EXTERNAL_REF_MESSAGE: &str =
    "external $ref references are not supported, only internal references starting with '#/' are allowed";

/// Convert and validate a raw schema document in one step.
pub fn validate_value(value: &Value) -> Result<(), ValidationErrors> {
    let schema = Schema::from_value(value).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add(e);
        errors
    })?;
    Validator::new().validate(&schema).into_result()
}

/// Checks a schema tree against the supported subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a root schema. Returns every violation found; an empty
    /// collection means the schema is legal.
    pub fn validate(&self, schema: &Schema) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if let Some(root) = schema.as_object() {
            check_reserved_properties(root, &mut errors);
        }
        walk(schema, "", &mut errors);
        if errors.has_errors() {
            debug!(count = errors.len(), "schema rejected");
        }
        errors
    }
}

fn walk(schema: &Schema, path: &str, errors: &mut ValidationErrors) {
    for composite in &schema.composites {
        errors.add(ValidationError::constraint(
            path,
            format!("{} is not supported", composite.keyword()),
        ));
        for (segment, branch) in composite.branches() {
            walk(branch, &join_path(path, &segment), errors);
        }
    }
    if schema.discriminator {
        errors.add(ValidationError::constraint(path, "discriminator is not supported"));
    }

    match &schema.kind {
        SchemaKind::Reference(reference) if !is_internal_ref(reference) => {
            errors.add(ValidationError::constraint(path, EXTERNAL_REF_MESSAGE));
        }
        SchemaKind::Unsupported(declared) => {
            errors.add(ValidationError::constraint(path, format!("unsupported type: {declared}")));
        }
        SchemaKind::Any if !allows_any(path) => {
            errors.add(ValidationError::constraint(path, "unsupported type: any"));
        }
        SchemaKind::Object(object) => {
            check_object(object, path, errors);
            for (name, property) in &object.properties {
                walk(property, &join_path(path, name), errors);
            }
            if let Some(AdditionalProperties::Schema(inner)) = &object.additional_properties {
                walk(inner, &join_path(path, "additionalProperties"), errors);
            }
        }
        SchemaKind::Array { items: Some(items) } => {
            walk(items, &join_path(path, "items"), errors);
        }
        _ => {}
    }
}

fn check_object(object: &ObjectSchema, path: &str, errors: &mut ValidationErrors) {
    match &object.additional_properties {
        Some(AdditionalProperties::Allowed(true)) => {
            errors.add(ValidationError::constraint(
                path,
                "additionalProperties: true is not allowed, use a schema object instead",
            ));
        }
        Some(AdditionalProperties::Schema(_)) if !object.properties.is_empty() => {
            errors.add(ValidationError::constraint(
                path,
                "object schemas cannot have both 'properties' and 'additionalProperties' defined",
            ));
        }
        Some(AdditionalProperties::Schema(inner)) if inner.is_unconstrained() && !is_platform_options(path) => {
            errors.add(ValidationError::constraint(
                join_path(path, "additionalProperties"),
                "additionalProperties may be type `any` only for the platformOptions property",
            ));
        }
        _ => {}
    }
}

fn check_reserved_properties(root: &ObjectSchema, errors: &mut ValidationErrors) {
    for (name, property) in &root.properties {
        match name.as_str() {
            RESERVED_STATUS | RESERVED_RECIPE => {
                errors.add(ValidationError::constraint(
                    name.as_str(),
                    format!("property '{name}' is reserved and cannot be used"),
                ));
            }
            RESERVED_APPLICATION | RESERVED_ENVIRONMENT if !property.is_string() => {
                errors.add(ValidationError::constraint(
                    name.as_str(),
                    format!("property '{name}' must be a string"),
                ));
            }
            RESERVED_CONNECTIONS => check_connections(property, errors),
            _ => {}
        }
    }

    if !root.properties.is_empty() && !root.properties.contains_key(RESERVED_ENVIRONMENT) {
        errors.add(ValidationError::constraint(
            RESERVED_ENVIRONMENT,
            format!("property '{RESERVED_ENVIRONMENT}' must be included in schema"),
        ));
    }
}

fn check_connections(property: &Schema, errors: &mut ValidationErrors) {
    match &property.kind {
        SchemaKind::Object(object) if object.explicit => {
            let is_map = matches!(
                object.additional_properties,
                Some(AdditionalProperties::Allowed(true)) | Some(AdditionalProperties::Schema(_))
            );
            if !is_map {
                errors.add(ValidationError::constraint(
                    RESERVED_CONNECTIONS,
                    format!("property '{RESERVED_CONNECTIONS}' must be a map object (use additionalProperties)"),
                ));
            }
        }
        // Typeless nodes and references are not constrained here.
        SchemaKind::Object(_) | SchemaKind::Untyped | SchemaKind::Reference(_) => {}
        _ => {
            errors.add(ValidationError::constraint(
                RESERVED_CONNECTIONS,
                format!("property '{RESERVED_CONNECTIONS}' must be a map object"),
            ));
        }
    }
}

fn is_internal_ref(reference: &str) -> bool {
    reference.starts_with('#')
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or_default()
}

fn is_platform_options(path: &str) -> bool {
    last_segment(path) == PLATFORM_OPTIONS
}

fn allows_any(path: &str) -> bool {
    if is_platform_options(path) {
        return true;
    }
    path.strip_suffix(".additionalProperties")
        .is_some_and(is_platform_options)
}
