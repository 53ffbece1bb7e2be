use std::sync::Arc;
use std::time::Duration;

use apix_proxy::{
    read_frame, register_services, write_frame, IpcMessage, MessageKind, ProxyError,
    ProxyRegistry, ServiceCall, ServiceCallAdapter, ServiceHandler, ServiceProxy,
};
use async_trait::async_trait;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

type Peer = (ReadHalf<DuplexStream>, WriteHalf<DuplexStream>);

fn proxy_with_raw_peer(name: &str) -> (ServiceProxy, Peer) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let (ar, aw) = tokio::io::split(a);
    let proxy = ServiceProxy::builder(name).attach(ar, aw);
    (proxy, tokio::io::split(b))
}

struct Echo;

#[async_trait]
impl ServiceHandler for Echo {
    async fn handle(&self, call: ServiceCall) -> Result<Vec<u8>, ProxyError> {
        if call.method == "fail" {
            return Err(ProxyError::Handler("boom".to_string()));
        }
        let params: serde_json::Value = call.params_json()?;
        Ok(serde_json::to_vec(&serde_json::json!({
            "service": call.service,
            "method": call.method,
            "params": params,
        }))
        .unwrap())
    }
}

#[tokio::test]
async fn concurrent_calls_match_out_of_order_replies() {
    let (proxy, (mut pr, mut pw)) = proxy_with_raw_peer("gw");

    let first = proxy.call_async(b"one".to_vec()).unwrap();
    let second = proxy.call_async(b"two".to_vec()).unwrap();
    assert_ne!(first.id(), second.id());

    let a = read_frame(&mut pr, 1024).await.unwrap().unwrap();
    let b = read_frame(&mut pr, 1024).await.unwrap().unwrap();
    assert_eq!(a.kind, MessageKind::Call);
    assert_eq!(b.kind, MessageKind::Call);

    // reply to the second call first
    for msg in [&b, &a] {
        let mut body = b"re:".to_vec();
        body.extend_from_slice(&msg.body);
        write_frame(&mut pw, &IpcMessage::reply(msg.id, body)).await.unwrap();
    }

    assert_eq!(first.wait().await.unwrap(), b"re:one".to_vec());
    assert_eq!(second.wait().await.unwrap(), b"re:two".to_vec());
    assert_eq!(proxy.pending_calls(), 0);
}

#[tokio::test]
async fn reply_without_pending_call_is_dropped() {
    let (proxy, (mut pr, mut pw)) = proxy_with_raw_peer("gw");
    let call = proxy.call_async(b"x".to_vec()).unwrap();
    let sent = read_frame(&mut pr, 1024).await.unwrap().unwrap();

    write_frame(&mut pw, &IpcMessage::reply(sent.id + 1000, b"stray".to_vec()))
        .await
        .unwrap();
    write_frame(&mut pw, &IpcMessage::reply(sent.id, b"ok".to_vec()))
        .await
        .unwrap();

    assert_eq!(call.wait().await.unwrap(), b"ok".to_vec());
    assert!(proxy.is_alive());
}

#[tokio::test]
async fn peer_hangup_fails_pending_and_future_calls() {
    let (proxy, (mut pr, pw)) = proxy_with_raw_peer("gw");
    let call = proxy.call_async(b"x".to_vec()).unwrap();
    read_frame(&mut pr, 1024).await.unwrap().unwrap();

    drop(pw);
    drop(pr);

    assert_eq!(call.wait().await.unwrap_err(), ProxyError::StreamClosed);
    proxy.closed().await;
    assert!(!proxy.is_alive());
    assert_eq!(
        proxy.call_sync(b"late".to_vec()).await.unwrap_err(),
        ProxyError::StreamClosed
    );
}

#[tokio::test]
async fn malformed_frame_kills_the_proxy() {
    let (proxy, (mut pr, mut pw)) = proxy_with_raw_peer("gw");
    let call = proxy.call_async(b"x".to_vec()).unwrap();
    read_frame(&mut pr, 1024).await.unwrap().unwrap();

    let mut bad = IpcMessage::reply(1, Vec::new()).encode().unwrap();
    bad[8] = 7;
    tokio::io::AsyncWriteExt::write_all(&mut pw, &bad).await.unwrap();

    assert!(matches!(
        call.wait().await.unwrap_err(),
        ProxyError::MalformedFrame(_)
    ));
    proxy.closed().await;
}

#[tokio::test]
async fn call_times_out_and_frees_its_slot() {
    let (proxy, (_pr, _pw)) = proxy_with_raw_peer("gw");
    let err = proxy
        .call_sync_timeout(b"slow".to_vec(), Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::CallTimedOut { timeout_ms: 50, .. }));
    assert_eq!(proxy.pending_calls(), 0);
    assert!(proxy.is_alive());
}

#[tokio::test]
async fn dropping_a_pending_call_frees_its_slot() {
    let (proxy, (_pr, _pw)) = proxy_with_raw_peer("gw");
    let call = proxy.call_async(b"x".to_vec()).unwrap();
    assert_eq!(proxy.pending_calls(), 1);
    drop(call);
    assert_eq!(proxy.pending_calls(), 0);
}

#[tokio::test]
async fn backend_registers_and_serves_calls_through_registry() {
    let (gw_side, be_side) = tokio::io::duplex(64 * 1024);
    let registry = Arc::new(ProxyRegistry::new());

    let (gr, gw) = tokio::io::split(gw_side);
    let gateway = ServiceProxy::builder("echo-proxy")
        .call_timeout(Some(Duration::from_secs(5)))
        .on_call(registry.registration_handler())
        .attach(gr, gw);

    let (br, bw) = tokio::io::split(be_side);
    let backend = ServiceProxy::builder("backend")
        .call_timeout(Some(Duration::from_secs(5)))
        .on_call(Arc::new(ServiceCallAdapter::new(Echo)))
        .attach(br, bw);

    let reg = register_services(&backend, ["echo", "mirror"]).await.unwrap();
    assert_eq!(reg.service_names, vec!["echo", "mirror"]);
    assert_eq!(registry.services(), vec!["echo", "mirror"]);
    assert!(registry.lookup("echo").unwrap().same_as(&gateway));

    let reply = registry
        .call_service("mirror", "Get", br#"{"id":7}"#.to_vec())
        .await
        .unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(
        reply,
        serde_json::json!({"service": "mirror", "method": "Get", "params": {"id": 7}})
    );
}

#[tokio::test]
async fn handler_error_is_answered_with_error_body() {
    let (gw_side, be_side) = tokio::io::duplex(64 * 1024);
    let (gr, gw) = tokio::io::split(gw_side);
    let gateway = ServiceProxy::builder("gw").attach(gr, gw);
    let (br, bw) = tokio::io::split(be_side);
    let _backend = ServiceProxy::builder("backend")
        .on_call(Arc::new(ServiceCallAdapter::new(Echo)))
        .attach(br, bw);

    let reply = gateway
        .call_service("echo", "fail", b"{}".to_vec())
        .await
        .unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(reply["error"], "service handler failed: boom");

    let reply = gateway.call_sync(b"no-delimiters".to_vec()).await.unwrap();
    let reply: serde_json::Value = serde_json::from_slice(&reply).unwrap();
    assert!(reply["error"]
        .as_str()
        .unwrap()
        .starts_with("malformed service call"));
}

#[tokio::test]
async fn call_without_handler_gets_empty_reply() {
    let (gw_side, be_side) = tokio::io::duplex(4096);
    let (gr, gw) = tokio::io::split(gw_side);
    let gateway = ServiceProxy::builder("gw").attach(gr, gw);
    let (br, bw) = tokio::io::split(be_side);
    let _peer = ServiceProxy::builder("bare").attach(br, bw);

    assert!(gateway.call_sync(b"anything".to_vec()).await.unwrap().is_empty());
}

#[tokio::test]
async fn shutdown_rejects_new_calls() {
    let (proxy, _peer) = proxy_with_raw_peer("gw");
    let pending = proxy.call_async(b"x".to_vec()).unwrap();
    proxy.shutdown();
    assert_eq!(pending.wait().await.unwrap_err(), ProxyError::StreamClosed);
    assert_eq!(
        proxy.call_async(Vec::new()).err(),
        Some(ProxyError::StreamClosed)
    );
}
