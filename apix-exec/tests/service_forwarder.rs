use std::sync::Arc;
use std::time::Duration;

use apix_core::types::{ApiForward, HttpMethod, ParamSource};
use apix_exec::{
    BufferedResponse, CompiledForward, ForwardError, Forwarder, Gateway, JsonParamReader,
    ServiceForwarder,
};
use apix_proxy::{
    ProxyError, ProxyRegistry, ServiceCall, ServiceCallAdapter, ServiceHandler, ServiceProxy,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

struct Echo;

#[async_trait]
impl ServiceHandler for Echo {
    async fn handle(&self, call: ServiceCall) -> Result<Vec<u8>, ProxyError> {
        let params: JsonValue = call.params_json()?;
        Ok(serde_json::to_vec(&json!({
            "service": call.service,
            "method": call.method,
            "params": params,
        }))
        .unwrap())
    }
}

/// A gateway-side proxy wired to an in-process echo backend, registered for `services`.
fn registry_with_backend(services: &[&str]) -> (Arc<ProxyRegistry>, ServiceProxy) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let (ar, aw) = tokio::io::split(a);
    let (br, bw) = tokio::io::split(b);
    let gateway_side = ServiceProxy::builder("echo-proxy").attach(ar, aw);
    let backend = ServiceProxy::builder("echo-backend")
        .on_call(Arc::new(ServiceCallAdapter::new(Echo)))
        .attach(br, bw);

    let registry = Arc::new(ProxyRegistry::new());
    registry.register_all(services.iter().copied(), &gateway_side);
    (registry, backend)
}

fn node(yaml: &str) -> CompiledForward {
    let fwd: ApiForward = serde_yaml::from_str(yaml).unwrap();
    CompiledForward::compile(&fwd).unwrap()
}

fn mapping(value: JsonValue) -> IndexMap<String, JsonValue> {
    serde_json::from_value(value).unwrap()
}

fn decode(bytes: Vec<u8>) -> JsonValue {
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn grpc_node_sends_mapping_to_service_method() {
    let (registry, _backend) = registry_with_backend(&["users"]);
    let fwd = ServiceForwarder::new(registry, Duration::from_secs(5)).unwrap();
    let n = node("{name: save, service: users, grpc: {method: Save, paramMapper: {id: id}}}");

    let reply = fwd.forward(&n, mapping(json!({"id": 7}))).await.unwrap();
    assert_eq!(
        decode(reply),
        json!({"service": "users", "method": "Save", "params": {"id": 7}})
    );
}

#[tokio::test]
async fn redis_node_sends_key_and_value_type() {
    let (registry, _backend) = registry_with_backend(&["cache"]);
    let fwd = ServiceForwarder::new(registry, Duration::from_secs(5)).unwrap();
    let n = node("{name: session, service: cache, redis: {key: 'token|pl.%s', type: hash}}");

    let reply = fwd
        .forward(&n, mapping(json!({"key": "pl.abc"})))
        .await
        .unwrap();
    assert_eq!(
        decode(reply),
        json!({"service": "cache", "method": "", "params": {"key": "pl.abc", "valType": "hash"}})
    );
}

#[tokio::test]
async fn unregistered_service_is_a_transport_error() {
    let (registry, _backend) = registry_with_backend(&["users"]);
    let fwd = ServiceForwarder::new(registry, Duration::from_secs(5)).unwrap();
    let n = node("{name: lost, service: nowhere, grpc: {method: Get}}");

    assert_eq!(
        fwd.forward(&n, IndexMap::new()).await.unwrap_err(),
        ForwardError::Transport {
            node: "lost".to_string(),
            source: ProxyError::ProxyNotFound("nowhere".to_string()),
        }
    );
}

#[tokio::test]
async fn closed_backend_fails_the_call() {
    let (registry, backend) = registry_with_backend(&["users"]);
    backend.shutdown();
    backend.closed().await;
    let fwd = ServiceForwarder::new(registry, Duration::from_secs(5)).unwrap();
    let n = node("{name: save, service: users, grpc: {method: Save}}");

    let err = fwd.forward(&n, IndexMap::new()).await.unwrap_err();
    assert!(matches!(err, ForwardError::Transport { .. }), "{err:?}");
}

#[test]
fn forwarder_builds_its_http_client() {
    let built: Result<ServiceForwarder, reqwest::Error> =
        ServiceForwarder::new(Arc::new(ProxyRegistry::new()), Duration::from_secs(1));
    let fwd = built.unwrap();
    assert!(!fwd.proxies().contains("anything"));
}

#[tokio::test]
async fn unreachable_http_target_is_an_http_error() {
    let fwd = ServiceForwarder::new(Arc::new(ProxyRegistry::new()), Duration::from_secs(2)).unwrap();
    let n = node("{name: hook, http: {url: 'http://127.0.0.1:1/hook', method: put}}");

    let err = fwd.forward(&n, IndexMap::new()).await.unwrap_err();
    assert!(matches!(err, ForwardError::Http { ref node, .. } if node == "hook"), "{err:?}");
}

#[tokio::test]
async fn gateway_runs_chain_through_backend_proxy() {
    let (registry, _backend) = registry_with_backend(&["users"]);
    let gw = Gateway::new(Arc::new(ServiceForwarder::new(registry, Duration::from_secs(5)).unwrap()));
    gw.add_api_doc(
        "users",
        r#"
version: 1.0.0
baseUrl: /api
apis:
  - url: /user
    params:
      queries:
        id: {type: integer, required: true}
    forwards:
      - name: load
        service: users
        grpc:
          method: Load
          paramMapper:
            key: id|user-%d
    returns:
      "200": {data: {service: {type: string}}}
"#,
    )
    .unwrap();

    let mut reader = JsonParamReader::new();
    reader.set(ParamSource::Queries, "id", json!("12"));
    let mut resp = BufferedResponse::new();
    let status = gw
        .handle(HttpMethod::Get, "/api/user", &reader, &mut resp)
        .await;

    assert_eq!(status, 200);
    assert_eq!(
        resp.json().unwrap(),
        json!({"service": "users", "method": "Load", "params": {"key": "user-12"}})
    );
}
