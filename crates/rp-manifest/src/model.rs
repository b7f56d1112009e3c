//! In-memory representation of a resource provider manifest.
//!
//! # Example YAML
//!
//! ```yaml
//! name: MyCompany.Resources
//! location:
//!   global: "http://localhost:8080"
//! types:
//!   testResources:
//!     description: A test resource
//!     capabilities: ["SupportsRecipes"]
//!     defaultApiVersion: "2025-01-01-preview"
//!     apiVersions:
//!       "2025-01-01-preview":
//!         schema:
//!           type: object
//!           properties:
//!             environment:
//!               type: string
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

/// Location used when a manifest declares none.
pub const DEFAULT_LOCATION: &str = "global";

/// Root of a manifest: a namespace owning a set of resource types.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceProvider {
    /// Provider namespace, e.g. `MyCompany.Resources`.
    #[serde(rename = "name", default)]
    pub namespace: String,
    /// Location name to address. An empty address means no custom endpoint.
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "unique_map"
    )]
    pub location: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "unique_map")]
    pub types: BTreeMap<String, ResourceType>,
}

/// One resource kind owned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ResourceType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_api_version: Option<String>,
    #[serde(default, deserialize_with = "unique_map")]
    pub api_versions: BTreeMap<String, ResourceTypeApiVersion>,
}

/// A schema-bound revision of a resource type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTypeApiVersion {
    /// Payload schema, kept opaque until schema validation converts it.
    #[serde(default)]
    pub schema: Option<serde_yaml::Value>,
}

/// The effective location of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    /// Empty when the location has no custom endpoint.
    pub address: String,
}

impl ResourceProvider {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Add or replace a resource type.
    pub fn with_type(mut self, name: impl Into<String>, resource_type: ResourceType) -> Self {
        self.types.insert(name.into(), resource_type);
        self
    }

    pub fn with_location(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.location.insert(name.into(), address.into());
        self
    }

    /// Resolve the location this provider registers into.
    ///
    /// Falls back to [`DEFAULT_LOCATION`] with no address. Parsed manifests
    /// carry at most one entry; for a provider built in code with several,
    /// the first entry by name is used.
    pub fn location(&self) -> Location {
        if self.location.len() > 1 {
            tracing::warn!(
                namespace = %self.namespace,
                count = self.location.len(),
                "provider declares several locations, only the first is registered"
            );
        }
        match self.location.iter().next() {
            Some((name, address)) => Location {
                name: name.clone(),
                address: address.clone(),
            },
            None => Location {
                name: DEFAULT_LOCATION.to_string(),
                address: String::new(),
            },
        }
    }

    /// Total number of API versions across all types.
    pub fn version_count(&self) -> usize {
        self.types.values().map(|t| t.api_versions.len()).sum()
    }
}

impl ResourceType {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_default_api_version(mut self, version: impl Into<String>) -> Self {
        self.default_api_version = Some(version.into());
        self
    }

    /// Add an API version carrying `schema`.
    pub fn with_version(mut self, version: impl Into<String>, schema: Option<serde_yaml::Value>) -> Self {
        self.api_versions
            .insert(version.into(), ResourceTypeApiVersion { schema });
        self
    }
}

/// Deserialize a string-keyed map, rejecting repeated keys instead of letting
/// the last one win.
fn unique_map<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueMap<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMap<V> {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique keys")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some(key) = access.next_key::<String>()? {
                if map.contains_key(&key) {
                    return Err(serde::de::Error::custom(format!("duplicate key `{key}`")));
                }
                let value = access.next_value()?;
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_any(UniqueMap(PhantomData))
}
