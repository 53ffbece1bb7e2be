//! Demo backend: registers the services named in `APIX_ECHO_SERVICES`
//! (comma separated, default `echo`) and answers every call with
//! `{"service", "method", "params"}`.

use apix_proxy::{serve_stdio, ProxyConfig, ProxyError, ServiceCall, ServiceHandler};
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

struct Echo;

#[async_trait]
impl ServiceHandler for Echo {
    async fn handle(&self, call: ServiceCall) -> Result<Vec<u8>, ProxyError> {
        let params: serde_json::Value = if call.params.is_empty() {
            serde_json::Value::Null
        } else {
            call.params_json()?
        };
        serde_json::to_vec(&serde_json::json!({
            "service": call.service,
            "method": call.method,
            "params": params,
        }))
        .map_err(|e| ProxyError::Handler(e.to_string()))
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the frame stream
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let services: Vec<String> = std::env::var("APIX_ECHO_SERVICES")
        .unwrap_or_else(|_| "echo".to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if let Err(e) = serve_stdio("apix-echo-proxy", &ProxyConfig::default(), services, Echo).await {
        tracing::error!(error = %e, "echo proxy stopped");
        std::process::exit(1);
    }
}
