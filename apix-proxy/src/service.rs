use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::call::ServiceCall;
use crate::config::DEFAULT_MAX_FRAME_LEN;
use crate::error::ProxyError;
use crate::frame::{read_frame, write_frame, IpcMessage, MessageKind};
use crate::pending::{PendingTable, ReplyResult};

/// Answers `call` frames arriving from the peer. The returned bytes become the
/// body of the matching `reply` frame.
#[async_trait]
pub trait CallHandler: Send + Sync {
    async fn handle(&self, proxy: &ServiceProxy, body: Vec<u8>) -> Result<Vec<u8>, ProxyError>;
}

struct Shared {
    name: String,
    next_id: AtomicU64,
    pending: PendingTable,
    outbound: mpsc::UnboundedSender<IpcMessage>,
    shutdown: CancellationToken,
    call_timeout: Option<Duration>,
}

/// Handle to one full-duplex IPC stream. Cheap to clone; all clones share the
/// same pending table and writer.
#[derive(Clone)]
pub struct ServiceProxy {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("name", &self.shared.name)
            .field("alive", &self.is_alive())
            .field("closed", &self.shared.pending.is_closed())
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}

pub struct ServiceProxyBuilder {
    name: String,
    call_timeout: Option<Duration>,
    max_frame_len: usize,
    handler: Option<Arc<dyn CallHandler>>,
}

impl ServiceProxyBuilder {
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max;
        self
    }

    pub fn on_call(mut self, handler: Arc<dyn CallHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Spawns the reader and writer tasks on the current runtime.
    pub fn attach<R, W>(self, reader: R, writer: W) -> ServiceProxy
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let proxy = ServiceProxy {
            shared: Arc::new(Shared {
                name: self.name,
                next_id: AtomicU64::new(1),
                pending: PendingTable::new(),
                outbound: tx,
                shutdown: shutdown.clone(),
                call_timeout: self.call_timeout,
            }),
        };

        tokio::spawn(writer_loop(proxy.name().to_string(), writer, rx, shutdown));
        tokio::spawn(reader_loop(
            proxy.clone(),
            reader,
            self.handler,
            self.max_frame_len,
        ));
        proxy
    }
}

impl ServiceProxy {
    pub fn builder(name: impl Into<String>) -> ServiceProxyBuilder {
        ServiceProxyBuilder {
            name: name.into(),
            call_timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            handler: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_alive(&self) -> bool {
        !self.shared.shutdown.is_cancelled()
    }

    pub fn pending_calls(&self) -> usize {
        self.shared.pending.len()
    }

    pub fn same_as(&self, other: &ServiceProxy) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Queues a message for the writer task, assigning an id when it is `0`.
    pub fn enqueue(&self, mut msg: IpcMessage) -> Result<u64, ProxyError> {
        if !self.is_alive() {
            return Err(ProxyError::StreamClosed);
        }
        if msg.id == 0 {
            msg.id = self.next_id();
        }
        let id = msg.id;
        self.shared
            .outbound
            .send(msg)
            .map_err(|_| ProxyError::StreamClosed)?;
        Ok(id)
    }

    /// Sends a call without waiting. The reply is collected through the returned handle.
    pub fn call_async(&self, body: Vec<u8>) -> Result<PendingCall, ProxyError> {
        let id = self.next_id();
        let rx = self.shared.pending.register(id)?;
        if let Err(e) = self.enqueue(IpcMessage::call(id, body)) {
            self.shared.pending.remove(id);
            return Err(e);
        }
        debug!(proxy = %self.name(), id, "call sent");
        Ok(PendingCall {
            id,
            rx,
            proxy: self.clone(),
        })
    }

    /// Sends a call and waits for its reply under the configured timeout.
    pub async fn call_sync(&self, body: Vec<u8>) -> Result<Vec<u8>, ProxyError> {
        self.call_async(body)?
            .wait_timeout(self.shared.call_timeout)
            .await
    }

    pub async fn call_sync_timeout(
        &self,
        body: Vec<u8>,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, ProxyError> {
        self.call_async(body)?.wait_timeout(timeout).await
    }

    /// Encodes a [`ServiceCall`] and performs a synchronous call with it.
    pub async fn call_service(
        &self,
        service: &str,
        method: &str,
        params: Vec<u8>,
    ) -> Result<Vec<u8>, ProxyError> {
        let body = ServiceCall::new(service, method, params).encode()?;
        self.call_sync(body).await
    }

    /// Stops both tasks and fails every outstanding call.
    pub fn shutdown(&self) {
        self.mark_dead(ProxyError::StreamClosed);
    }

    /// Resolves once the stream is closed.
    pub async fn closed(&self) {
        self.shared.shutdown.cancelled().await;
    }

    fn mark_dead(&self, reason: ProxyError) {
        let failed = self.shared.pending.close(reason);
        if !self.shared.shutdown.is_cancelled() {
            self.shared.shutdown.cancel();
            info!(proxy = %self.name(), failed_calls = failed, "proxy stream closed");
        }
    }

    fn dispatch(&self, msg: IpcMessage, handler: Option<&Arc<dyn CallHandler>>) {
        match msg.kind {
            MessageKind::Reply => {
                if !self.shared.pending.complete(msg.id, msg.body) {
                    debug!(proxy = %self.name(), id = msg.id, "dropping reply with no pending call");
                }
            }
            MessageKind::Call => {
                let proxy = self.clone();
                let handler = handler.cloned();
                tokio::spawn(async move {
                    let id = msg.id;
                    let reply = match handler {
                        Some(h) => h.handle(&proxy, msg.body).await.unwrap_or_else(|e| {
                            warn!(proxy = %proxy.name(), id, error = %e, "inbound call failed");
                            error_body(&e)
                        }),
                        None => {
                            debug!(proxy = %proxy.name(), id, "no call handler installed");
                            Vec::new()
                        }
                    };
                    if let Err(e) = proxy.enqueue(IpcMessage::reply(id, reply)) {
                        debug!(proxy = %proxy.name(), id, error = %e, "reply not sent");
                    }
                });
            }
        }
    }
}

fn error_body(e: &ProxyError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "error": e.to_string() })).unwrap_or_default()
}

/// A call in flight. Dropping it abandons the call and frees its slot.
pub struct PendingCall {
    id: u64,
    rx: oneshot::Receiver<ReplyResult>,
    proxy: ServiceProxy,
}

impl PendingCall {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn wait(self) -> Result<Vec<u8>, ProxyError> {
        self.wait_timeout(None).await
    }

    pub async fn wait_timeout(mut self, timeout: Option<Duration>) -> Result<Vec<u8>, ProxyError> {
        let received = match timeout {
            None => (&mut self.rx).await,
            Some(limit) => match tokio::time::timeout(limit, &mut self.rx).await {
                Ok(r) => r,
                Err(_) => {
                    self.proxy.shared.pending.remove(self.id);
                    warn!(proxy = %self.proxy.name(), id = self.id, "call timed out");
                    return Err(ProxyError::CallTimedOut {
                        id: self.id,
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
        };
        received.unwrap_or(Err(ProxyError::StreamClosed))
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        self.proxy.shared.pending.remove(self.id);
    }
}

async fn reader_loop<R>(
    proxy: ServiceProxy,
    mut reader: R,
    handler: Option<Arc<dyn CallHandler>>,
    max_frame_len: usize,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let reason = loop {
        let frame = tokio::select! {
            _ = proxy.shared.shutdown.cancelled() => break ProxyError::StreamClosed,
            frame = read_frame(&mut reader, max_frame_len) => frame,
        };
        match frame {
            Ok(Some(msg)) => proxy.dispatch(msg, handler.as_ref()),
            Ok(None) => {
                debug!(proxy = %proxy.name(), "peer closed the stream");
                break ProxyError::StreamClosed;
            }
            Err(e) => {
                warn!(proxy = %proxy.name(), error = %e, "read failed");
                break match e {
                    crate::frame::FrameError::Io(_) => ProxyError::StreamClosed,
                    other => ProxyError::MalformedFrame(other.to_string()),
                };
            }
        }
    };
    proxy.mark_dead(reason);
}

async fn writer_loop<W>(
    name: String,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<IpcMessage>,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    loop {
        let msg = tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(m) => m,
                None => break,
            },
        };
        if let Err(e) = write_frame(&mut writer, &msg).await {
            warn!(proxy = %name, id = msg.id, error = %e, "write failed");
            shutdown.cancel();
            break;
        }
        debug!(proxy = %name, id = msg.id, kind = ?msg.kind, len = msg.body.len(), "frame written");
    }
}
