//! Capability traits for the remote control plane.
//!
//! Each resource kind has its own store with an upsert-and-poll operation
//! and a get. [`ControlPlane`] bundles the four so the registrar can be
//! handed a single client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::{Cancellation, Context};

/// HTTP status the control plane uses for optimistic-concurrency conflicts.
pub const STATUS_CONFLICT: u16 = 409;

/// Failure reported by a control-plane client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status} ({code}): {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A long-running operation reached a failed terminal state.
    #[error("operation finished with status {status}: {message}")]
    OperationFailed { status: String, message: String },

    /// A response body could not be understood.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Cancelled(#[from] Cancellation),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(STATUS_CONFLICT)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RemoteError::Status {
            status: STATUS_CONFLICT,
            code: "Conflict".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RemoteError::Status {
            status: 404,
            code: "NotFound".to_string(),
            message: message.into(),
        }
    }
}

/// Envelope shared by every control-plane resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: P,
}

impl<P: Default> Resource<P> {
    pub fn with_properties(properties: P) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeProperties {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVersionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub resource_types: BTreeMap<String, LocationResourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// The versions of one type served at a location. Values are empty objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResourceType {
    #[serde(default)]
    pub api_versions: BTreeMap<String, Map<String, Value>>,
}

impl LocationResourceType {
    pub fn with_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_versions: versions.into_iter().map(|v| (v.into(), Map::new())).collect(),
        }
    }
}

pub type ProviderResource = Resource<ProviderProperties>;
pub type ResourceTypeResource = Resource<ResourceTypeProperties>;
pub type ApiVersionResource = Resource<ApiVersionProperties>;
pub type LocationResource = Resource<LocationProperties>;

#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Create or update a resource provider and wait for the operation to finish.
    async fn upsert_provider(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        resource: &ProviderResource,
    ) -> Result<ProviderResource, RemoteError>;

    async fn get_provider(&self, ctx: &Context, plane: &str, provider: &str) -> Result<ProviderResource, RemoteError>;
}

#[async_trait]
pub trait TypeStore: Send + Sync {
    async fn upsert_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        resource: &ResourceTypeResource,
    ) -> Result<ResourceTypeResource, RemoteError>;

    async fn get_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
    ) -> Result<ResourceTypeResource, RemoteError>;
}

#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn upsert_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
        resource: &ApiVersionResource,
    ) -> Result<ApiVersionResource, RemoteError>;

    async fn get_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
    ) -> Result<ApiVersionResource, RemoteError>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn upsert_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
        resource: &LocationResource,
    ) -> Result<LocationResource, RemoteError>;

    async fn get_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
    ) -> Result<LocationResource, RemoteError>;
}

/// A client that implements every store.
pub trait ControlPlane: ProviderStore + TypeStore + VersionStore + LocationStore {}

impl<T> ControlPlane for T where T: ProviderStore + TypeStore + VersionStore + LocationStore {}
