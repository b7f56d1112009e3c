//! Structural rules applied to every decoded manifest.
//!
//! Each field of a [`ResourceProvider`] is checked against a [`Rule`]. All
//! violations are collected into [`FieldErrors`], one human-readable line per
//! offending field.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::ResourceProvider;

static NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]+\.[A-Z][A-Za-z0-9]+$").expect("Invalid namespace regex"));
static TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").expect("Invalid type name regex"));
static API_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}(-preview)?$").expect("Invalid api version regex"));
static CAPABILITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]+$").expect("Invalid capability regex"));
static LOCATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]*$").expect("Invalid location name regex"));

/// A constraint a single manifest field must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Namespace,
    TypeName,
    ApiVersion,
    Capability,
    LocationName,
    SingleLocation,
}

impl Rule {
    /// Whether `value` satisfies this rule.
    pub fn check(self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::Namespace => NAMESPACE.is_match(value),
            Rule::TypeName => TYPE_NAME.is_match(value),
            Rule::ApiVersion => API_VERSION.is_match(value),
            Rule::Capability => CAPABILITY.is_match(value),
            Rule::LocationName => LOCATION_NAME.is_match(value),
            Rule::SingleLocation => true,
        }
    }

    fn describe(self, field: &str, value: &str) -> String {
        match self {
            Rule::Required => format!("{field} is a required field"),
            Rule::Namespace => format!(
                "{field} '{value}' is invalid, it must be two PascalCase segments separated by a dot (e.g. MyCompany.Resources)"
            ),
            Rule::TypeName => format!(
                "{field} '{value}' is invalid, it must start with a lowercase letter and contain only letters and digits"
            ),
            Rule::ApiVersion => format!(
                "{field} '{value}' is invalid, it must be a date in the form YYYY-MM-DD with an optional -preview suffix"
            ),
            Rule::Capability => format!(
                "{field} '{value}' is invalid, it must start with an uppercase letter and contain only letters and digits"
            ),
            Rule::LocationName => format!(
                "{field} '{value}' is invalid, it must start with a letter and contain only letters, digits and hyphens"
            ),
            Rule::SingleLocation => format!("{field} may declare at most one entry, found {value}"),
        }
    }
}

pub fn is_valid_namespace(value: &str) -> bool {
    Rule::Namespace.check(value)
}

pub fn is_valid_type_name(value: &str) -> bool {
    Rule::TypeName.check(value)
}

pub fn is_valid_api_version(value: &str) -> bool {
    Rule::ApiVersion.check(value)
}

pub fn is_valid_capability(value: &str) -> bool {
    Rule::Capability.check(value)
}

pub fn is_valid_location_name(value: &str) -> bool {
    Rule::LocationName.check(value)
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub rule: Rule,
    pub value: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rule.describe(&self.field, &self.value))
    }
}

/// Every rule violation found in one manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    fn check(&mut self, field: impl Into<String>, rule: Rule, value: &str) {
        if !rule.check(value) {
            self.errors.push(FieldError {
                field: field.into(),
                rule,
                value: value.to_string(),
            });
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "manifest is valid"),
            [single] => write!(f, "invalid manifest: {single}"),
            many => {
                write!(f, "invalid manifest, {} problems found:", many.len())?;
                for error in many {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for FieldErrors {}

/// Check every field of `provider` and collect the violations.
pub fn validate(provider: &ResourceProvider) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if provider.namespace.is_empty() {
        errors.check("name", Rule::Required, &provider.namespace);
    } else {
        errors.check("name", Rule::Namespace, &provider.namespace);
    }

    if provider.location.len() > 1 {
        errors.errors.push(FieldError {
            field: "location".to_string(),
            rule: Rule::SingleLocation,
            value: provider.location.len().to_string(),
        });
    }
    for name in provider.location.keys() {
        errors.check(format!("location[{name}]"), Rule::LocationName, name);
    }

    for (type_name, resource_type) in &provider.types {
        let type_field = format!("types.{type_name}");
        errors.check(format!("types[{type_name}]"), Rule::TypeName, type_name);

        if let Some(default) = &resource_type.default_api_version {
            errors.check(format!("{type_field}.defaultApiVersion"), Rule::ApiVersion, default);
        }

        for (i, capability) in resource_type.capabilities.iter().enumerate() {
            errors.check(format!("{type_field}.capabilities[{i}]"), Rule::Capability, capability);
        }

        for (version, api_version) in &resource_type.api_versions {
            errors.check(format!("{type_field}.apiVersions[{version}]"), Rule::ApiVersion, version);
            if api_version.schema.is_none() {
                errors.check(format!("{type_field}.apiVersions.{version}.schema"), Rule::Required, "");
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("MyCompany.Resources", true)]
    #[case("Company1.Resources2", true)]
    #[case("myCompany.Resources", false)]
    #[case("MyCompany.resources", false)]
    #[case("MyCompanyResources", false)]
    #[case("1Company.Resources", false)]
    #[case("My-Company.Resources", false)]
    #[case("A.B", false)]
    #[case("", false)]
    fn test_namespace_rule(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_namespace(value), valid);
    }

    #[rstest]
    #[case("widgets", true)]
    #[case("widgets2", true)]
    #[case("myWidgets", true)]
    #[case("w", true)]
    #[case("Widgets", false)]
    #[case("2widgets", false)]
    #[case("my-widgets", false)]
    #[case("", false)]
    fn test_type_name_rule(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_type_name(value), valid);
    }

    #[rstest]
    #[case("2023-10-01", true)]
    #[case("2023-10-01-preview", true)]
    #[case("20231001", false)]
    #[case("23-10-01", false)]
    #[case("2023-10-01-beta", false)]
    #[case("", false)]
    fn test_api_version_rule(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_api_version(value), valid);
    }

    #[rstest]
    #[case("Synchronous", true)]
    #[case("Sync2", true)]
    #[case("synchronous", false)]
    #[case("2Sync", false)]
    #[case("Sync-Async", false)]
    #[case("", false)]
    fn test_capability_rule(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_capability(value), valid);
    }

    #[rstest]
    #[case("global", true)]
    #[case("east-us2", true)]
    #[case("East", true)]
    #[case("2east", false)]
    #[case("east?x=1#frag", false)]
    #[case("east/west", false)]
    #[case("", false)]
    fn test_location_name_rule(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_valid_location_name(value), valid);
    }

    #[test]
    fn test_missing_name_is_required() {
        let errors = validate(&ResourceProvider::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].rule, Rule::Required);
        assert_eq!(errors.to_string(), "invalid manifest: name is a required field");
    }

    #[test]
    fn test_all_violations_collected() {
        let provider = ResourceProvider::new("bad")
            .with_location("east", "")
            .with_location("west", "")
            .with_type(
                "Widgets",
                ResourceType::default()
                    .with_capability("lower")
                    .with_default_api_version("v1")
                    .with_version("2025-13-01-beta", None),
            );

        let errors = validate(&provider).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "location",
                "types[Widgets]",
                "types.Widgets.defaultApiVersion",
                "types.Widgets.capabilities[0]",
                "types.Widgets.apiVersions[2025-13-01-beta]",
                "types.Widgets.apiVersions.2025-13-01-beta.schema",
            ]
        );
        assert!(errors.to_string().starts_with("invalid manifest, 7 problems found:"));
    }

    #[test]
    fn test_location_name_with_reserved_characters() {
        let provider = ResourceProvider::new("MyCompany.Resources").with_location("east?x=1#frag", "");
        let errors = validate(&provider).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].field, "location[east?x=1#frag]");
        assert_eq!(errors.errors[0].rule, Rule::LocationName);
    }

    #[test]
    fn test_empty_types_is_valid() {
        assert!(validate(&ResourceProvider::new("MyCompany.Resources")).is_ok());
    }
}
