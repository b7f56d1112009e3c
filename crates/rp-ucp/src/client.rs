//! The HTTP implementation of the control-plane stores.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use rp_register::Context;
use rp_register::store::{
    ApiVersionResource, LocationResource, LocationStore, ProviderResource, ProviderStore, RemoteError,
    ResourceTypeResource, TypeStore, VersionStore,
};

use crate::error::Error;
use crate::options::ClientOptions;
use crate::poller::{self, PollState};
use crate::response::{decode, status_error};
use crate::url::ResourcePath;

/// A control-plane client speaking the UCP REST API.
///
/// Upserts are `PUT`s that may complete asynchronously; the client polls the
/// announced operation until it finishes and then reads the resource back.
/// Every request and every poll wait is bounded by the caller's [`Context`].
#[derive(Debug, Clone)]
pub struct UcpClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    options: ClientOptions,
}

impl UcpClient {
    pub fn new(options: ClientOptions) -> crate::Result<Self> {
        let endpoint = options.endpoint.trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&endpoint).map_err(|err| Error::InvalidEndpoint {
            endpoint: options.endpoint.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidEndpoint {
                endpoint: options.endpoint.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("rpreg/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: parsed,
            options: ClientOptions { endpoint, ..options },
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn url(&self, plane: &str, path: ResourcePath<'_>) -> reqwest::Url {
        path.url(&self.endpoint, plane, &self.options.api_version)
    }

    async fn get<T: DeserializeOwned>(&self, ctx: &Context, plane: &str, path: ResourcePath<'_>) -> Result<T, RemoteError> {
        let url = self.url(plane, path);
        debug!(method = "GET", %url, "control plane request");
        let response = self.send(ctx, self.http.get(url)).await?;
        let body = read_body(ctx, response).await?;
        decode(&body)
    }

    async fn put<T>(&self, ctx: &Context, plane: &str, path: ResourcePath<'_>, resource: &T) -> Result<T, RemoteError>
    where
        T: Serialize + DeserializeOwned + Clone + Sync,
    {
        let url = self.url(plane, path);
        debug!(method = "PUT", %url, "control plane request");
        let response = self.send(ctx, self.http.put(url).json(resource)).await?;

        if let Some(operation) = poller::operation_url(response.status(), response.headers(), response.url()) {
            self.wait_for_operation(ctx, operation).await?;
            return self.get(ctx, plane, path).await;
        }

        let body = read_body(ctx, response).await?;
        if body.trim().is_empty() {
            return Ok(resource.clone());
        }
        decode(&body)
    }

    /// Poll a long-running operation until it reaches a terminal state.
    async fn wait_for_operation(&self, ctx: &Context, operation: reqwest::Url) -> Result<(), RemoteError> {
        let mut polls = 0u32;
        loop {
            polls += 1;
            let response = self.send(ctx, self.http.get(operation.clone())).await?;
            let status = response.status();
            let body = read_body(ctx, response).await?;
            match poller::classify(status, &body)? {
                PollState::Succeeded => {
                    debug!(operation = %operation, polls, "operation succeeded");
                    return Ok(());
                }
                PollState::Failed { status, message } => {
                    return Err(RemoteError::OperationFailed { status, message });
                }
                PollState::InProgress(state) => {
                    debug!(operation = %operation, state = %state, polls, "operation in progress");
                    ctx.run(tokio::time::sleep(self.options.poll_interval)).await?;
                }
            }
        }
    }

    /// Send a request, turning non-success statuses into errors.
    async fn send(&self, ctx: &Context, request: RequestBuilder) -> Result<Response, RemoteError> {
        if let Some(cancellation) = ctx.err() {
            return Err(cancellation.into());
        }
        let response = ctx
            .run(request.send())
            .await?
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "control plane response");
        if status.is_success() {
            return Ok(response);
        }
        let body = read_body(ctx, response).await?;
        Err(status_error(status, &body))
    }
}

async fn read_body(ctx: &Context, response: Response) -> Result<String, RemoteError> {
    ctx.run(response.text())
        .await?
        .map_err(|err| RemoteError::Transport(err.to_string()))
}

#[async_trait]
impl ProviderStore for UcpClient {
    async fn upsert_provider(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        resource: &ProviderResource,
    ) -> Result<ProviderResource, RemoteError> {
        self.put(ctx, plane, ResourcePath::Provider { provider }, resource)
            .await
    }

    async fn get_provider(&self, ctx: &Context, plane: &str, provider: &str) -> Result<ProviderResource, RemoteError> {
        self.get(ctx, plane, ResourcePath::Provider { provider }).await
    }
}

#[async_trait]
impl TypeStore for UcpClient {
    async fn upsert_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        resource: &ResourceTypeResource,
    ) -> Result<ResourceTypeResource, RemoteError> {
        self.put(ctx, plane, ResourcePath::ResourceType { provider, type_name }, resource)
            .await
    }

    async fn get_resource_type(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
    ) -> Result<ResourceTypeResource, RemoteError> {
        self.get(ctx, plane, ResourcePath::ResourceType { provider, type_name })
            .await
    }
}

#[async_trait]
impl VersionStore for UcpClient {
    async fn upsert_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
        resource: &ApiVersionResource,
    ) -> Result<ApiVersionResource, RemoteError> {
        let path = ResourcePath::ApiVersion {
            provider,
            type_name,
            version,
        };
        self.put(ctx, plane, path, resource).await
    }

    async fn get_api_version(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        type_name: &str,
        version: &str,
    ) -> Result<ApiVersionResource, RemoteError> {
        let path = ResourcePath::ApiVersion {
            provider,
            type_name,
            version,
        };
        self.get(ctx, plane, path).await
    }
}

#[async_trait]
impl LocationStore for UcpClient {
    async fn upsert_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
        resource: &LocationResource,
    ) -> Result<LocationResource, RemoteError> {
        self.put(ctx, plane, ResourcePath::Location { provider, location }, resource)
            .await
    }

    async fn get_location(
        &self,
        ctx: &Context,
        plane: &str,
        provider: &str,
        location: &str,
    ) -> Result<LocationResource, RemoteError> {
        self.get(ctx, plane, ResourcePath::Location { provider, location })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_endpoints() {
        for endpoint in ["not a url", "ftp://localhost:21"] {
            let err = UcpClient::new(ClientOptions::new(endpoint)).unwrap_err();
            assert!(matches!(err, Error::InvalidEndpoint { .. }), "{endpoint}: {err}");
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = UcpClient::new(ClientOptions::new("http://localhost:9000/")).unwrap();
        assert_eq!(client.options().endpoint, "http://localhost:9000");
        assert!(
            client
                .url("local", ResourcePath::Provider { provider: "A.B" })
                .as_str()
                .starts_with("http://localhost:9000/apis/api.ucp.dev/")
        );
    }

    #[tokio::test]
    async fn test_canceled_context_sends_nothing() {
        let client = UcpClient::new(ClientOptions::new("http://127.0.0.1:1")).unwrap();
        let ctx = Context::new();
        ctx.cancel();
        let err = client.get_provider(&ctx, "local", "A.B").await.unwrap_err();
        assert_eq!(err, RemoteError::Cancelled(rp_register::Cancellation::Canceled));
    }
}
