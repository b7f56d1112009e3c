//! Tests for the UCP client against a local fake control plane.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rp_register::store::{
    LocationResource, LocationResourceType, LocationStore, ProviderResource, ProviderStore, ResourceTypeProperties,
    ResourceTypeResource, TypeStore,
};
use rp_register::{Context, Registrar, RemoteError, RetryPolicy};
use rp_test_utils::fixtures;
use rp_ucp::{ClientOptions, UcpClient};
use tiny_http::{Header, Response, Server, StatusCode};

const PREFIX: &str = "/apis/api.ucp.dev/v1alpha3/planes/radius/local/providers/System.Resources/resourceproviders";
const QUERY: &str = "?api-version=2023-10-01-preview";

/// One scripted response.
struct Reply {
    status: u16,
    body: String,
    headers: Vec<(&'static str, String)>,
}

impl Reply {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    method: String,
    url: String,
    body: String,
}

struct FakeUcp {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: thread::JoinHandle<()>,
}

impl FakeUcp {
    /// Serve `script(base_url)` in order, one reply per request.
    fn spawn(script: impl FnOnce(&str) -> Vec<Reply>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("server");
        let base_url = format!("http://{}", server.server_addr());
        let replies = script(&base_url);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            for reply in replies {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                    return;
                };
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).expect("read body");
                recorded.lock().unwrap().push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });
                let mut response = Response::from_string(reply.body)
                    .with_status_code(StatusCode(reply.status))
                    .with_header(Header::from_bytes("Content-Type", "application/json").expect("header"));
                for (name, value) in reply.headers {
                    response = response.with_header(Header::from_bytes(name, value).expect("header"));
                }
                let _ = request.respond(response);
            }
        });
        Self {
            base_url,
            requests,
            handle,
        }
    }

    fn client(&self) -> UcpClient {
        UcpClient::new(ClientOptions::new(&self.base_url).with_poll_interval(Duration::from_millis(10))).unwrap()
    }

    fn finish(self) -> Vec<Recorded> {
        self.handle.join().expect("join server");
        let requests = self.requests.lock().unwrap();
        requests.clone()
    }
}

fn lines(requests: &[Recorded]) -> Vec<String> {
    requests
        .iter()
        .map(|r| format!("{} {}", r.method, r.url))
        .collect()
}

#[tokio::test]
async fn test_synchronous_upsert_returns_body() {
    let server = FakeUcp::spawn(|_| {
        vec![Reply::json(
            200,
            r#"{"name":"widgets","properties":{"capabilities":["SupportsRecipes"],"provisioningState":"Succeeded"}}"#,
        )]
    });
    let client = server.client();
    let resource = ResourceTypeResource::with_properties(ResourceTypeProperties {
        capabilities: vec!["SupportsRecipes".into()],
        ..Default::default()
    });

    let created = client
        .upsert_resource_type(&Context::new(), "local", "MyCompany.Resources", "widgets", &resource)
        .await
        .unwrap();
    assert_eq!(created.name.as_deref(), Some("widgets"));
    assert_eq!(created.properties.provisioning_state.as_deref(), Some("Succeeded"));

    let requests = server.finish();
    assert_eq!(
        lines(&requests),
        vec![format!("PUT {PREFIX}/MyCompany.Resources/resourcetypes/widgets{QUERY}")]
    );
    let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        sent,
        serde_json::json!({ "properties": { "capabilities": ["SupportsRecipes"] } })
    );
}

#[tokio::test]
async fn test_empty_upsert_body_echoes_request() {
    let server = FakeUcp::spawn(|_| vec![Reply::json(200, "")]);
    let client = server.client();
    let resource = ProviderResource {
        location: Some("global".into()),
        ..Default::default()
    };

    let created = client
        .upsert_provider(&Context::new(), "local", "MyCompany.Resources", &resource)
        .await
        .unwrap();
    assert_eq!(created, resource);
    server.finish();
}

#[tokio::test]
async fn test_async_operation_is_polled_then_read_back() {
    let server = FakeUcp::spawn(|base| {
        vec![
            Reply::json(201, "{}").header("Azure-AsyncOperation", format!("{base}/operations/1")),
            Reply::json(200, r#"{"status":"Updating"}"#),
            Reply::json(200, r#"{"status":"Succeeded"}"#),
            Reply::json(200, r#"{"properties":{"provisioningState":"Succeeded"}}"#),
        ]
    });
    let client = server.client();

    let created = client
        .upsert_provider(&Context::new(), "local", "MyCompany.Resources", &ProviderResource::default())
        .await
        .unwrap();
    assert_eq!(created.properties.provisioning_state.as_deref(), Some("Succeeded"));

    assert_eq!(
        lines(&server.finish()),
        vec![
            format!("PUT {PREFIX}/MyCompany.Resources{QUERY}"),
            "GET /operations/1".to_string(),
            "GET /operations/1".to_string(),
            format!("GET {PREFIX}/MyCompany.Resources{QUERY}"),
        ]
    );
}

#[tokio::test]
async fn test_location_header_polls_until_done() {
    let server = FakeUcp::spawn(|_| {
        vec![
            Reply::json(202, "").header("Location", "/operations/2"),
            Reply::json(202, ""),
            Reply::json(200, ""),
            Reply::json(200, r#"{"properties":{"resourceTypes":{}}}"#),
        ]
    });
    let client = server.client();

    client
        .upsert_location(
            &Context::new(),
            "local",
            "MyCompany.Resources",
            "global",
            &LocationResource::default(),
        )
        .await
        .unwrap();

    let requests = server.finish();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[1].url, "/operations/2");
    assert_eq!(
        requests[3].url,
        format!("{PREFIX}/MyCompany.Resources/locations/global{QUERY}")
    );
}

#[tokio::test]
async fn test_failed_operation() {
    let server = FakeUcp::spawn(|base| {
        vec![
            Reply::json(201, "{}").header("Azure-AsyncOperation", format!("{base}/operations/3")),
            Reply::json(200, r#"{"status":"Failed","error":{"code":"Internal","message":"schema rejected"}}"#),
        ]
    });
    let client = server.client();

    let err = client
        .upsert_provider(&Context::new(), "local", "MyCompany.Resources", &ProviderResource::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::OperationFailed {
            status: "Failed".into(),
            message: "schema rejected".into(),
        }
    );
    server.finish();
}

#[tokio::test]
async fn test_conflict_status_is_classified() {
    let server = FakeUcp::spawn(|_| {
        vec![Reply::json(
            409,
            r#"{"error":{"code":"Conflict","message":"another operation is in progress"}}"#,
        )]
    });
    let client = server.client();

    let err = client
        .get_resource_type(&Context::new(), "local", "MyCompany.Resources", "widgets")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        err.to_string(),
        "request failed with status 409 (Conflict): another operation is in progress"
    );
    server.finish();
}

#[tokio::test]
async fn test_deadline_interrupts_polling() {
    let server = FakeUcp::spawn(|base| {
        let mut replies =
            vec![Reply::json(201, "{}").header("Azure-AsyncOperation", format!("{base}/operations/4"))];
        replies.extend((0..100).map(|_| Reply::json(200, r#"{"status":"Updating"}"#)));
        replies
    });
    let client = UcpClient::new(ClientOptions::new(&server.base_url).with_poll_interval(Duration::from_millis(50)))
        .unwrap();
    let ctx = Context::new().with_timeout(Duration::from_millis(200));

    let err = client
        .upsert_provider(&ctx, "local", "MyCompany.Resources", &ProviderResource::default())
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::Cancelled(rp_register::Cancellation::DeadlineExceeded));
    drop(client);
    server.finish();
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = UcpClient::new(ClientOptions::new(endpoint)).unwrap();
    let err = client
        .get_provider(&Context::new(), "local", "MyCompany.Resources")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)), "{err}");
}

#[tokio::test]
async fn test_registrar_over_http() {
    let ok = || Reply::json(200, "{}");
    let server = FakeUcp::spawn(|_| {
        vec![
            Reply::json(409, r#"{"error":{"code":"Conflict","message":"busy"}}"#),
            ok(),
            ok(),
            ok(),
            ok(),
            ok(),
        ]
    });
    let registrar = Registrar::new(server.client(), "local").with_retry_policy(RetryPolicy {
        initial_backoff: Duration::from_millis(10),
        max_attempts: 5,
    });

    registrar
        .register_file(&Context::new(), &fixtures::fixture_path(fixtures::VALID))
        .await
        .unwrap();

    let requests = server.finish();
    let ns = format!("{PREFIX}/MyCompany.Resources");
    assert_eq!(
        lines(&requests),
        vec![
            format!("PUT {ns}{QUERY}"),
            format!("PUT {ns}{QUERY}"),
            format!("PUT {ns}/resourcetypes/testResources{QUERY}"),
            format!("PUT {ns}/resourcetypes/testResources/apiversions/2025-01-01-preview{QUERY}"),
            format!("PUT {ns}/locations/global{QUERY}"),
            format!("GET {ns}{QUERY}"),
        ]
    );

    let location: LocationResource = serde_json::from_str(&requests[4].body).unwrap();
    assert_eq!(
        location.properties.resource_types.get("testResources"),
        Some(&LocationResourceType::with_versions(["2025-01-01-preview"]))
    );
    let version: serde_json::Value = serde_json::from_str(&requests[3].body).unwrap();
    assert_eq!(version["properties"]["schema"]["type"], "object");
}

#[tokio::test]
async fn test_reserved_characters_stay_in_the_path() {
    let server = FakeUcp::spawn(|_| vec![Reply::json(200, r#"{"properties":{"resourceTypes":{}}}"#)]);
    let client = server.client();

    client
        .get_location(&Context::new(), "local", "MyCompany.Resources", "east?x=1#frag")
        .await
        .unwrap();

    assert_eq!(
        lines(&server.finish()),
        vec![format!("GET {PREFIX}/MyCompany.Resources/locations/east%3Fx=1%23frag{QUERY}")]
    );
}
