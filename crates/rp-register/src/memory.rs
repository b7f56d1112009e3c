//! An in-memory control plane.
//!
//! Implements every store with upsert semantics, enforces that parents exist
//! before children are written, and records each call in order. Conflicts and
//! failures can be injected per call kind.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::store::{
    ApiVersionResource, LocationResource, LocationStore, ProviderResource, ProviderStore, RemoteError,
    Resource, ResourceTypeResource, TypeStore, VersionStore,
};

const PROVISIONING_SUCCEEDED: &str = "Succeeded";

/// The kind of a recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    UpsertProvider,
    GetProvider,
    UpsertResourceType,
    GetResourceType,
    UpsertApiVersion,
    GetApiVersion,
    UpsertLocation,
    GetLocation,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub plane: String,
    /// `provider[/type[@version]]` or `provider/locations/name`.
    pub target: String,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} (plane {})", self.kind, self.target, self.plane)
    }
}

type ProviderKey = (String, String);
type TypeKey = (String, String, String);
type VersionKey = (String, String, String, String);

#[derive(Default)]
struct State {
    providers: BTreeMap<ProviderKey, ProviderResource>,
    types: BTreeMap<TypeKey, ResourceTypeResource>,
    versions: BTreeMap<VersionKey, ApiVersionResource>,
    locations: BTreeMap<TypeKey, LocationResource>,
    calls: Vec<Call>,
    conflicts: HashMap<CallKind, u32>,
    failures: HashMap<CallKind, RemoteError>,
}

/// A control plane held in memory.
#[derive(Default)]
pub struct InMemoryControlPlane {
    state: Mutex<State>,
    latency: Duration,
}

impl InMemoryControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call take `latency` before it completes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer the next `count` calls of `kind` with a 409 conflict.
    pub fn inject_conflicts(&self, kind: CallKind, count: u32) {
        self.lock().conflicts.insert(kind, count);
    }

    /// Answer every call of `kind` with `error`.
    pub fn inject_failure(&self, kind: CallKind, error: RemoteError) {
        self.lock().failures.insert(kind, error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failures.clear();
        state.conflicts.clear();
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.lock().calls.iter().map(|c| c.kind).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn provider(&self, plane: &str, provider: &str) -> Option<ProviderResource> {
        self.lock().providers.get(&key2(plane, provider)).cloned()
    }

    pub fn resource_type(&self, plane: &str, provider: &str, type_name: &str) -> Option<ResourceTypeResource> {
        self.lock().types.get(&key3(plane, provider, type_name)).cloned()
    }

    pub fn api_version(
        &self,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
    ) -> Option<ApiVersionResource> {
        self.lock()
            .versions
            .get(&key4(plane, provider, type_name, version))
            .cloned()
    }

    pub fn location(&self, plane: &str, provider: &str, location: &str) -> Option<LocationResource> {
        self.lock().locations.get(&key3(plane, provider, location)).cloned()
    }

    /// Number of stored objects of every kind.
    pub fn object_count(&self) -> usize {
        let state = self.lock();
        state.providers.len() + state.types.len() + state.versions.len() + state.locations.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call, wait out the latency and apply injected outcomes.
    async fn begin(&self, ctx: &Context, kind: CallKind, plane: &str, target: String) -> Result<(), RemoteError> {
        tracing::debug!(?kind, plane, target = %target, "in-memory call");
        {
            let mut state = self.lock();
            state.calls.push(Call {
                kind,
                plane: plane.to_string(),
                target: target.clone(),
            });
        }

        if let Some(cancellation) = ctx.err() {
            return Err(cancellation.into());
        }
        if !self.latency.is_zero() {
            ctx.run(tokio::time::sleep(self.latency)).await?;
        }

        let mut state = self.lock();
        if let Some(remaining) = state.conflicts.get_mut(&kind) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::conflict(format!("{target} is being updated by another operation")));
            }
        }
        if let Some(error) = state.failures.get(&kind) {
            return Err(error.clone());
        }
        Ok(())
    }
}

fn key2(a: &str, b: &str) -> ProviderKey {
    (a.to_string(), b.to_string())
}

fn key3(a: &str, b: &str, c: &str) -> TypeKey {
    (a.to_string(), b.to_string(), c.to_string())
}

fn key4(a: &str, b: &str, c: &str, d: &str) -> VersionKey {
    (a.to_string(), b.to_string(), c.to_string(), d.to_string())
}

fn provider_id(plane: &str, provider: &str) -> String {
    format!("/planes/radius/{plane}/providers/System.Resources/resourceproviders/{provider}")
}

/// Stamp the server-owned fields onto a stored copy of `resource`.
fn stored<P: Clone>(resource: &Resource<P>, id: String, name: &str, kind: &str) -> Resource<P> {
    Resource {
        id: Some(id),
        name: Some(name.to_string()),
        kind: Some(kind.to_string()),
        ..resource.clone()
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::not_found(format!("the resource {what} was not found"))
}

#[async_trait]
impl ProviderStore for InMemoryControlPlane {
    async fn upsert_provider(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        resource: &ProviderResource,
    ) -> Result<ProviderResource, RemoteError> {
        self.begin(ctx, CallKind::UpsertProvider, plane, provider.to_string())
            .await?;
        let mut value = stored(
            resource,
            provider_id(plane, provider),
            provider,
            "System.Resources/resourceProviders",
        );
        value.properties.provisioning_state = Some(PROVISIONING_SUCCEEDED.to_string());
        self.lock().providers.insert(key2(plane, provider), value.clone());
        Ok(value)
    }

    async fn get_provider(&self, ctx: &Context, plane: &str, provider: &str) -> Result<ProviderResource, RemoteError> {
        self.begin(ctx, CallKind::GetProvider, plane, provider.to_string())
            .await?;
        self.lock()
            .providers
            .get(&key2(plane, provider))
            .cloned()
            .ok_or_else(|| not_found(provider))
    }
}

#[async_trait]
impl TypeStore for InMemoryControlPlane {
    async fn upsert_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        resource: &ResourceTypeResource,
    ) -> Result<ResourceTypeResource, RemoteError> {
        let target = format!("{provider}/{type_name}");
        self.begin(ctx, CallKind::UpsertResourceType, plane, target.clone())
            .await?;
        let mut state = self.lock();
        if !state.providers.contains_key(&key2(plane, provider)) {
            return Err(not_found(provider));
        }
        let mut value = stored(
            resource,
            format!("{}/resourcetypes/{type_name}", provider_id(plane, provider)),
            type_name,
            "System.Resources/resourceProviders/resourceTypes",
        );
        value.properties.provisioning_state = Some(PROVISIONING_SUCCEEDED.to_string());
        state.types.insert(key3(plane, provider, type_name), value.clone());
        Ok(value)
    }

    async fn get_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
    ) -> Result<ResourceTypeResource, RemoteError> {
        let target = format!("{provider}/{type_name}");
        self.begin(ctx, CallKind::GetResourceType, plane, target.clone())
            .await?;
        self.lock()
            .types
            .get(&key3(plane, provider, type_name))
            .cloned()
            .ok_or_else(|| not_found(&target))
    }
}

#[async_trait]
impl VersionStore for InMemoryControlPlane {
    async fn upsert_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
        resource: &ApiVersionResource,
    ) -> Result<ApiVersionResource, RemoteError> {
        let target = format!("{provider}/{type_name}@{version}");
        self.begin(ctx, CallKind::UpsertApiVersion, plane, target).await?;
        let mut state = self.lock();
        if !state.types.contains_key(&key3(plane, provider, type_name)) {
            return Err(not_found(&format!("{provider}/{type_name}")));
        }
        let mut value = stored(
            resource,
            format!(
                "{}/resourcetypes/{type_name}/apiversions/{version}",
                provider_id(plane, provider)
            ),
            version,
            "System.Resources/resourceProviders/resourceTypes/apiVersions",
        );
        value.properties.provisioning_state = Some(PROVISIONING_SUCCEEDED.to_string());
        state
            .versions
            .insert(key4(plane, provider, type_name, version), value.clone());
        Ok(value)
    }

    async fn get_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
    ) -> Result<ApiVersionResource, RemoteError> {
        let target = format!("{provider}/{type_name}@{version}");
        self.begin(ctx, CallKind::GetApiVersion, plane, target.clone())
            .await?;
        self.lock()
            .versions
            .get(&key4(plane, provider, type_name, version))
            .cloned()
            .ok_or_else(|| not_found(&target))
    }
}

#[async_trait]
impl LocationStore for InMemoryControlPlane {
    async fn upsert_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
        resource: &LocationResource,
    ) -> Result<LocationResource, RemoteError> {
        self.begin(
            ctx,
            CallKind::UpsertLocation,
            plane,
            format!("{provider}/locations/{location}"),
        )
        .await?;
        let mut state = self.lock();
        if !state.providers.contains_key(&key2(plane, provider)) {
            return Err(not_found(provider));
        }
        for (type_name, entry) in &resource.properties.resource_types {
            for version in entry.api_versions.keys() {
                if !state
                    .versions
                    .contains_key(&key4(plane, provider, type_name, version))
                {
                    return Err(RemoteError::Status {
                        status: 400,
                        code: "BadRequest".to_string(),
                        message: format!("location references unknown API version {provider}/{type_name}@{version}"),
                    });
                }
            }
        }
        let mut value = stored(
            resource,
            format!("{}/locations/{location}", provider_id(plane, provider)),
            location,
            "System.Resources/resourceProviders/locations",
        );
        value.properties.provisioning_state = Some(PROVISIONING_SUCCEEDED.to_string());
        state
            .locations
            .insert(key3(plane, provider, location), value.clone());
        Ok(value)
    }

    async fn get_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
    ) -> Result<LocationResource, RemoteError> {
        let target = format!("{provider}/locations/{location}");
        self.begin(ctx, CallKind::GetLocation, plane, target.clone())
            .await?;
        self.lock()
            .locations
            .get(&key3(plane, provider, location))
            .cloned()
            .ok_or_else(|| not_found(&target))
    }
}
