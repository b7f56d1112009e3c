//! Sequencing of the remote calls that register a manifest.
//!
//! A run creates the provider, then every type followed by its versions, and
//! finally writes the location that references all of them before reading
//! the provider back. Every call is an upsert, so a failed run is recovered
//! by running it again.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::path::{Path, PathBuf};

use rp_manifest::{ResourceProvider, ResourceType};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::progress::{NoProgress, Progress, ProgressEvent};
use crate::retry::{RetryNotice, RetryPolicy, with_retry};
use crate::store::{
    ApiVersionProperties, ApiVersionResource, ControlPlane, LocationProperties, LocationResource,
    LocationResourceType, ProviderProperties, ProviderResource, RemoteError, ResourceTypeProperties,
    ResourceTypeResource,
};

/// Type and version references accumulated for the final location write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationAggregate {
    address: Option<String>,
    resource_types: BTreeMap<String, BTreeSet<String>>,
}

impl LocationAggregate {
    pub fn insert<I, S>(&mut self, type_name: impl Into<String>, versions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types
            .insert(type_name.into(), versions.into_iter().map(Into::into).collect());
    }

    /// Attach an address; an empty one is ignored.
    pub fn set_address(&mut self, address: &str) {
        if !address.is_empty() {
            self.address = Some(address.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resource_types.is_empty()
    }

    pub fn into_resource(self) -> LocationResource {
        LocationResource::with_properties(LocationProperties {
            address: self.address,
            resource_types: self
                .resource_types
                .into_iter()
                .map(|(name, versions)| (name, LocationResourceType::with_versions(versions)))
                .collect(),
            provisioning_state: None,
        })
    }
}

/// Registers manifests against a [`ControlPlane`].
pub struct Registrar<C> {
    client: C,
    plane: String,
    retry: RetryPolicy,
    progress: Box<dyn Progress>,
}

impl<C: ControlPlane> Registrar<C> {
    pub fn new(client: C, plane: impl Into<String>) -> Self {
        Self {
            client,
            plane: plane.into(),
            retry: RetryPolicy::default(),
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, progress: impl Progress + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn plane(&self) -> &str {
        &self.plane
    }

    /// Register a provider with all of its types and versions.
    pub async fn register(&self, ctx: &Context, provider: &ResourceProvider) -> Result<()> {
        let namespace = provider.namespace.as_str();
        let location = provider.location();
        info!(namespace, plane = %self.plane, location = %location.name, "registering resource provider");

        self.progress.report(&ProgressEvent::CreatingProvider { namespace });
        let resource = ProviderResource {
            location: Some(location.name.clone()),
            ..ProviderResource::with_properties(ProviderProperties::default())
        };
        self.call(ctx, format!("create resource provider {namespace}"), || {
            self.client.upsert_provider(ctx, &self.plane, namespace, &resource)
        })
        .await?;

        let mut aggregate = LocationAggregate::default();
        for (type_name, resource_type) in &provider.types {
            self.progress
                .report(&ProgressEvent::CreatingType { namespace, type_name });
            self.create_type(ctx, namespace, type_name, resource_type).await?;
            aggregate.insert(type_name.as_str(), resource_type.api_versions.keys().map(String::as_str));
        }
        aggregate.set_address(&location.address);

        self.progress.report(&ProgressEvent::CreatingLocation {
            namespace,
            location: &location.name,
            address: &location.address,
        });
        let resource = aggregate.into_resource();
        self.call(ctx, format!("create location {namespace}/{}", location.name), || {
            self.client
                .upsert_location(ctx, &self.plane, namespace, &location.name, &resource)
        })
        .await?;

        self.call(ctx, format!("get resource provider {namespace}"), || {
            self.client.get_provider(ctx, &self.plane, namespace)
        })
        .await?;

        info!(namespace, types = provider.types.len(), "resource provider registered");
        Ok(())
    }

    /// Validate the manifest at `path` and register it.
    pub async fn register_file(&self, ctx: &Context, path: &Path) -> Result<ResourceProvider> {
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyManifestPath);
        }
        let provider = rp_manifest::validate_manifest(path)?;
        self.register(ctx, &provider).await?;
        Ok(provider)
    }

    /// Register every manifest file in `dir`, in file name order.
    ///
    /// Stops at the first file that fails. Returns the registered files.
    pub async fn register_directory(&self, ctx: &Context, dir: &Path) -> Result<Vec<PathBuf>> {
        let files = rp_manifest::manifest_files(dir)?;
        for path in &files {
            self.progress
                .report(&ProgressEvent::RegisteringManifest { path });
            self.register_file(ctx, path)
                .await
                .map_err(|source| Error::ManifestFile {
                    path: path.clone(),
                    source: Box::new(source),
                })?;
        }
        Ok(files)
    }

    /// Register a single type from the manifest at `path` and merge it into
    /// the existing location.
    pub async fn register_single_type(&self, ctx: &Context, path: &Path, type_name: &str) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::EmptyManifestPath);
        }
        let provider = rp_manifest::validate_manifest(path)?;
        let resource_type = provider
            .types
            .get(type_name)
            .ok_or_else(|| Error::TypeNotFound {
                type_name: type_name.to_string(),
                path: path.to_path_buf(),
            })?;

        let namespace = provider.namespace.as_str();
        let location = provider.location();

        self.progress.report(&ProgressEvent::CreatingTypeWithCapabilities {
            namespace,
            type_name,
            capabilities: &resource_type.capabilities,
        });
        self.create_type(ctx, namespace, type_name, resource_type).await?;

        let mut existing = self
            .call(ctx, format!("get location {namespace}/{}", location.name), || {
                self.client
                    .get_location(ctx, &self.plane, namespace, &location.name)
            })
            .await?;
        if !location.address.is_empty() {
            existing.properties.address = Some(location.address.clone());
        }
        existing.properties.resource_types.insert(
            type_name.to_string(),
            LocationResourceType::with_versions(resource_type.api_versions.keys().map(String::as_str)),
        );

        self.progress.report(&ProgressEvent::UpdatingLocation {
            namespace,
            location: &location.name,
        });
        self.call(ctx, format!("update location {namespace}/{}", location.name), || {
            self.client
                .upsert_location(ctx, &self.plane, namespace, &location.name, &existing)
        })
        .await?;

        self.progress
            .report(&ProgressEvent::TypeRegistered { namespace, type_name });
        Ok(())
    }

    /// Upsert one type, then each of its versions.
    async fn create_type(
        &self,
        ctx: &Context,
        namespace: &str,
        type_name: &str,
        resource_type: &ResourceType,
    ) -> Result<()> {
        let resource = ResourceTypeResource::with_properties(ResourceTypeProperties {
            capabilities: resource_type.capabilities.clone(),
            default_api_version: resource_type.default_api_version.clone(),
            description: resource_type.description.clone(),
            provisioning_state: None,
        });
        self.call(ctx, format!("create resource type {namespace}/{type_name}"), || {
            self.client
                .upsert_resource_type(ctx, &self.plane, namespace, type_name, &resource)
        })
        .await?;

        for (version, api_version) in &resource_type.api_versions {
            self.progress.report(&ProgressEvent::CreatingApiVersion {
                namespace,
                type_name,
                version,
            });
            let resource_name = format!("{namespace}/{type_name}@{version}");
            let schema = api_version
                .schema
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|source| Error::SchemaEncoding {
                    resource: resource_name.clone(),
                    source,
                })?;
            let resource = ApiVersionResource::with_properties(ApiVersionProperties {
                schema,
                provisioning_state: None,
            });
            self.call(ctx, format!("create API version {resource_name}"), || {
                self.client
                    .upsert_api_version(ctx, &self.plane, namespace, type_name, version, &resource)
            })
            .await?;
        }
        Ok(())
    }

    /// Run one remote call through the retry engine.
    async fn call<T, F, Fut>(&self, ctx: &Context, step: String, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RemoteError>>,
    {
        debug!(step = %step, plane = %self.plane, "remote call");
        let progress = &self.progress;
        with_retry(ctx, &self.retry, operation, |notice: &RetryNotice<'_, RemoteError>| {
            progress.report(&ProgressEvent::Conflict {
                attempt: notice.attempt,
                max_attempts: notice.max_attempts,
                error: notice.error.to_string(),
                wait: notice.wait,
            });
        })
        .await
        .map_err(|source| Error::Remote { step, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_aggregate_into_resource() {
        let mut aggregate = LocationAggregate::default();
        assert!(aggregate.is_empty());
        aggregate.insert("widgets", ["2025-01-01", "2025-02-01"]);
        aggregate.insert("gadgets", Vec::<String>::new());
        aggregate.set_address("");

        let resource = aggregate.into_resource();
        assert_eq!(resource.properties.address, None);
        assert_eq!(
            serde_json::to_value(&resource.properties.resource_types).unwrap(),
            json!({
                "gadgets": { "apiVersions": {} },
                "widgets": { "apiVersions": { "2025-01-01": {}, "2025-02-01": {} } }
            })
        );
    }

    #[test]
    fn test_aggregate_keeps_address() {
        let mut aggregate = LocationAggregate::default();
        aggregate.set_address("http://localhost:8080");
        assert_eq!(
            aggregate.into_resource().properties.address.as_deref(),
            Some("http://localhost:8080")
        );
    }
}
