//! Helpers for writing a backend process that the gateway launches.
//!
//! A backend speaks the frame protocol on its own stdin/stdout, announces the
//! services it owns with one registration call and then answers
//! `service\0method\0params` calls until the gateway closes the pipe.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::call::{Registration, ServiceCall};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::service::{CallHandler, ServiceProxy};

/// Business logic of a backend, fed with already decoded calls.
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    async fn handle(&self, call: ServiceCall) -> Result<Vec<u8>, ProxyError>;
}

/// Adapts a [`ServiceHandler`] to the raw inbound-call seam of [`ServiceProxy`].
pub struct ServiceCallAdapter<H> {
    inner: H,
}

impl<H: ServiceHandler> ServiceCallAdapter<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: ServiceHandler> CallHandler for ServiceCallAdapter<H> {
    async fn handle(&self, _proxy: &ServiceProxy, body: Vec<u8>) -> Result<Vec<u8>, ProxyError> {
        let call = ServiceCall::decode(&body)?;
        debug!(service = %call.service, method = %call.method, "inbound service call");
        self.inner.handle(call).await
    }
}

/// Attaches a proxy to this process's stdin and stdout.
pub fn stdio_proxy(
    name: impl Into<String>,
    config: &ProxyConfig,
    handler: Arc<dyn CallHandler>,
) -> ServiceProxy {
    ServiceProxy::builder(name)
        .call_timeout(config.call_timeout())
        .max_frame_len(config.max_frame_len)
        .on_call(handler)
        .attach(tokio::io::stdin(), tokio::io::stdout())
}

/// Announces `names` to the peer and waits for its acknowledgement.
pub async fn register_services<I, S>(
    proxy: &ServiceProxy,
    names: I,
) -> Result<Registration, ProxyError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let reg = Registration::new(names);
    let ack = proxy.call_sync(reg.encode()?).await?;
    if !ack.is_empty() {
        // An acknowledgement that is not a registration record is tolerated.
        if let Ok(echoed) = Registration::decode(&ack) {
            debug!(services = ?echoed.service_names, "registration acknowledged");
        }
    }
    info!(services = ?reg.service_names, "services registered with gateway");
    Ok(reg)
}

/// Runs a backend on stdio until the gateway hangs up.
pub async fn serve_stdio<H, I, S>(
    name: &str,
    config: &ProxyConfig,
    services: I,
    handler: H,
) -> Result<(), ProxyError>
where
    H: ServiceHandler + 'static,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let proxy = stdio_proxy(name, config, Arc::new(ServiceCallAdapter::new(handler)));
    register_services(&proxy, services).await?;
    proxy.closed().await;
    info!(proxy = %name, "gateway closed the stream");
    Ok(())
}
