//! Typed schema tree built from an untyped schema document.
//!
//! A schema document is converted once into a [`Schema`] whose [`SchemaKind`]
//! carries typed children (properties, items, additional properties). The
//! validator walks this tree instead of re-interpreting raw JSON.
//!
//! Keywords that do not affect legality (`description`, `required`, `enum`,
//! `format`, `readOnly`, extension keys, ...) are ignored by the conversion.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{ValidationError, join_path};

/// A node of a schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    /// Composite keywords declared on this node, in document order.
    pub composites: Vec<Composite>,
    /// Whether a `discriminator` keyword is present.
    pub discriminator: bool,
}

/// The declared shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// `type: object`, or a typeless node with object keywords.
    Object(ObjectSchema),
    /// `type: array`, or a typeless node with `items`.
    Array { items: Option<Box<Schema>> },
    String,
    Integer,
    Boolean,
    /// `type: any`
    Any,
    /// No `type` and no structural keywords; accepts any value.
    Untyped,
    /// A `$ref` node. Sibling keywords are ignored.
    Reference(String),
    /// A `type` value outside the supported set.
    Unsupported(String),
}

/// Children of an object node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: BTreeMap<String, Schema>,
    pub additional_properties: Option<AdditionalProperties>,
    /// `true` when the node declared `type: object` itself.
    pub explicit: bool,
}

/// Value of an `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// A composite keyword and its branches.
#[derive(Debug, Clone, PartialEq)]
pub enum Composite {
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    Not(Box<Schema>),
}

impl Composite {
    /// The JSON Schema keyword this composite was declared with.
    pub fn keyword(&self) -> &'static str {
        match self {
            Composite::AllOf(_) => "allOf",
            Composite::AnyOf(_) => "anyOf",
            Composite::OneOf(_) => "oneOf",
            Composite::Not(_) => "not",
        }
    }

    /// Branches paired with the path segment that addresses them.
    pub fn branches(&self) -> Vec<(String, &Schema)> {
        match self {
            Composite::AllOf(items) | Composite::AnyOf(items) | Composite::OneOf(items) => items
                .iter()
                .enumerate()
                .map(|(i, schema)| (format!("{}[{}]", self.keyword(), i), schema))
                .collect(),
            Composite::Not(schema) => vec![("not".to_string(), schema.as_ref())],
        }
    }
}

impl Schema {
    /// Convert a JSON schema document into a typed tree.
    ///
    /// Fails with a [`ErrorKind::Parse`](crate::ErrorKind::Parse) error when
    /// the document, or any nested schema position, is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        Self::parse_at(value, "")
    }

    fn parse_at(value: &Value, path: &str) -> Result<Self, ValidationError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null if !path.is_empty() => {
                return Err(ValidationError::schema(path, "property schema is nil"));
            }
            other => {
                return Err(ValidationError::parse(
                    path,
                    format!("expected a schema object, found {}", value_kind(other)),
                ));
            }
        };

        let composites = parse_composites(map, path)?;
        let discriminator = map.contains_key("discriminator");

        let kind = if let Some(reference) = map.get("$ref") {
            match reference {
                Value::String(r) => SchemaKind::Reference(r.clone()),
                other => {
                    return Err(ValidationError::parse(
                        path,
                        format!("$ref must be a string, found {}", value_kind(other)),
                    ));
                }
            }
        } else {
            match map.get("type") {
                Some(Value::String(t)) => match t.as_str() {
                    "object" => SchemaKind::Object(parse_object(map, path, true)?),
                    "array" => parse_array(map, path)?,
                    "string" => SchemaKind::String,
                    "integer" => SchemaKind::Integer,
                    "boolean" => SchemaKind::Boolean,
                    "any" => SchemaKind::Any,
                    other => SchemaKind::Unsupported(other.to_string()),
                },
                Some(other) => SchemaKind::Unsupported(other.to_string()),
                None if map.contains_key("properties") || map.contains_key("additionalProperties") => {
                    SchemaKind::Object(parse_object(map, path, false)?)
                }
                None if map.contains_key("items") => parse_array(map, path)?,
                None => SchemaKind::Untyped,
            }
        };

        Ok(Self {
            kind,
            composites,
            discriminator,
        })
    }

    /// Whether this node places no restriction at all on its values.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.kind, SchemaKind::Untyped) && self.composites.is_empty() && !self.discriminator
    }

    /// The object children, if this is an object node.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, SchemaKind::String)
    }
}

fn parse_object(map: &Map<String, Value>, path: &str, explicit: bool) -> Result<ObjectSchema, ValidationError> {
    let mut properties = BTreeMap::new();
    match map.get("properties") {
        None | Some(Value::Null) => {}
        Some(Value::Object(props)) => {
            for (name, prop) in props {
                properties.insert(name.clone(), Schema::parse_at(prop, &join_path(path, name))?);
            }
        }
        Some(other) => {
            return Err(ValidationError::parse(
                join_path(path, "properties"),
                format!("expected a map of property schemas, found {}", value_kind(other)),
            ));
        }
    }

    let additional_path = join_path(path, "additionalProperties");
    let additional_properties = match map.get("additionalProperties") {
        None => None,
        Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
        Some(Value::Null) => {
            return Err(ValidationError::schema(additional_path, "additionalProperties schema is nil"));
        }
        Some(value) => Some(AdditionalProperties::Schema(Box::new(Schema::parse_at(
            value,
            &additional_path,
        )?))),
    };

    Ok(ObjectSchema {
        properties,
        additional_properties,
        explicit,
    })
}

fn parse_array(map: &Map<String, Value>, path: &str) -> Result<SchemaKind, ValidationError> {
    let items = match map.get("items") {
        None | Some(Value::Null) => None,
        Some(value) => Some(Box::new(Schema::parse_at(value, &join_path(path, "items"))?)),
    };
    Ok(SchemaKind::Array { items })
}

fn parse_composites(map: &Map<String, Value>, path: &str) -> Result<Vec<Composite>, ValidationError> {
    let mut composites = Vec::new();

    for keyword in ["allOf", "anyOf", "oneOf"] {
        let Some(value) = map.get(keyword) else {
            continue;
        };
        let Value::Array(items) = value else {
            return Err(ValidationError::parse(
                join_path(path, keyword),
                format!("expected a list of schemas, found {}", value_kind(value)),
            ));
        };
        let branches = items
            .iter()
            .enumerate()
            .map(|(i, item)| Schema::parse_at(item, &join_path(path, &format!("{keyword}[{i}]"))))
            .collect::<Result<Vec<_>, _>>()?;
        composites.push(match keyword {
            "allOf" => Composite::AllOf(branches),
            "anyOf" => Composite::AnyOf(branches),
            _ => Composite::OneOf(branches),
        });
    }

    if let Some(value) = map.get("not") {
        composites.push(Composite::Not(Box::new(Schema::parse_at(
            value,
            &join_path(path, "not"),
        )?)));
    }

    Ok(composites)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_with_typed_children() {
        let schema = Schema::from_value(&json!({
            "type": "object",
            "description": "A widget",
            "properties": {
                "name": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } },
                "count": { "type": "integer" }
            }
        }))
        .unwrap();

        let object = schema.as_object().unwrap();
        assert!(object.explicit);
        assert_eq!(
            object.properties.keys().collect::<Vec<_>>(),
            vec!["count", "name", "tags"]
        );
        assert!(object.properties["name"].is_string());
        match &object.properties["tags"].kind {
            SchemaKind::Array { items: Some(items) } => assert!(items.is_string()),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_typeless_with_properties_is_implicit_object() {
        let schema = Schema::from_value(&json!({
            "properties": { "name": { "type": "string" } }
        }))
        .unwrap();
        let object = schema.as_object().unwrap();
        assert!(!object.explicit);
    }

    #[test]
    fn test_unsupported_type_is_kept() {
        let schema = Schema::from_value(&json!({ "type": "invalidtype" })).unwrap();
        assert_eq!(schema.kind, SchemaKind::Unsupported("invalidtype".to_string()));

        let schema = Schema::from_value(&json!({ "type": ["string", "null"] })).unwrap();
        assert_eq!(schema.kind, SchemaKind::Unsupported(r#"["string","null"]"#.to_string()));
    }

    #[test]
    fn test_composites_and_discriminator_are_recorded() {
        let schema = Schema::from_value(&json!({
            "allOf": [{ "type": "string" }, { "type": "object" }],
            "not": { "type": "integer" },
            "discriminator": { "propertyName": "kind" }
        }))
        .unwrap();

        let keywords: Vec<_> = schema.composites.iter().map(Composite::keyword).collect();
        assert_eq!(keywords, vec!["allOf", "not"]);
        assert!(schema.discriminator);

        let branches: Vec<_> = schema.composites[0].branches().into_iter().map(|(p, _)| p).collect();
        assert_eq!(branches, vec!["allOf[0]", "allOf[1]"]);
    }

    #[test]
    fn test_reference_node() {
        let schema = Schema::from_value(&json!({ "$ref": "#/definitions/Widget", "type": "object" })).unwrap();
        assert_eq!(schema.kind, SchemaKind::Reference("#/definitions/Widget".to_string()));
    }

    #[test]
    fn test_additional_properties_forms() {
        let schema = Schema::from_value(&json!({ "type": "object", "additionalProperties": false })).unwrap();
        assert_eq!(
            schema.as_object().unwrap().additional_properties,
            Some(AdditionalProperties::Allowed(false))
        );

        let schema = Schema::from_value(&json!({ "type": "object", "additionalProperties": {} })).unwrap();
        match &schema.as_object().unwrap().additional_properties {
            Some(AdditionalProperties::Schema(inner)) => assert!(inner.is_unconstrained()),
            other => panic!("expected schema, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_document_fails_to_parse() {
        let err = Schema::from_value(&json!("just a string")).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Parse);
        assert!(err.message.contains("found string"));
    }

    #[test]
    fn test_nil_property_schema() {
        let err = Schema::from_value(&json!({
            "type": "object",
            "properties": { "name": null }
        }))
        .unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.message, "property schema is nil");
    }

    #[test]
    fn test_nested_parse_error_reports_path() {
        let err = Schema::from_value(&json!({
            "type": "object",
            "properties": {
                "spec": { "type": "object", "properties": { "size": 42 } }
            }
        }))
        .unwrap_err();
        assert_eq!(err.field, "spec.size");
    }
}
