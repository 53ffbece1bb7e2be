use std::sync::Arc;
use std::time::Duration;

use apix_proxy::ProxyRegistry;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{CompiledForward, CompiledTarget, ForwardError};

/// Delivers one node's resolved parameters to its backend and returns the raw reply.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        node: &CompiledForward,
        mapping: IndexMap<String, JsonValue>,
    ) -> Result<Vec<u8>, ForwardError>;
}

/// Routes grpc and redis nodes through backend proxies and http nodes
/// through reqwest.
pub struct ServiceForwarder {
    proxies: Arc<ProxyRegistry>,
    client: reqwest::Client,
    http_timeout: Duration,
}

impl ServiceForwarder {
    pub fn new(
        proxies: Arc<ProxyRegistry>,
        http_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("apix-exec/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            proxies,
            client,
            http_timeout,
        })
    }

    pub fn proxies(&self) -> &Arc<ProxyRegistry> {
        &self.proxies
    }

    async fn call_service(
        &self,
        node: &CompiledForward,
        method: &str,
        params: &JsonValue,
    ) -> Result<Vec<u8>, ForwardError> {
        let body = encode(node, params)?;
        self.proxies
            .call_service(&node.service, method, body)
            .await
            .map_err(|source| ForwardError::Transport {
                node: node.name.clone(),
                source,
            })
    }

    async fn call_http(
        &self,
        node: &CompiledForward,
        url: &url::Url,
        method: &str,
        params: &JsonValue,
    ) -> Result<Vec<u8>, ForwardError> {
        let http_err = |e: reqwest::Error| ForwardError::Http {
            node: node.name.clone(),
            message: if e.is_timeout() {
                "timeout".to_string()
            } else {
                e.to_string()
            },
        };
        let method: reqwest::Method = method.parse().map_err(|e: <reqwest::Method as std::str::FromStr>::Err| {
            ForwardError::Http {
                node: node.name.clone(),
                message: e.to_string(),
            }
        })?;
        let resp = self
            .client
            .request(method, url.clone())
            .timeout(self.http_timeout)
            .json(params)
            .send()
            .await
            .map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ForwardError::HttpStatus {
                node: node.name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await.map_err(http_err)?.to_vec())
    }
}

fn encode(node: &CompiledForward, params: &JsonValue) -> Result<Vec<u8>, ForwardError> {
    serde_json::to_vec(params).map_err(|e| ForwardError::Encode {
        node: node.name.clone(),
        message: e.to_string(),
    })
}

#[async_trait]
impl Forwarder for ServiceForwarder {
    async fn forward(
        &self,
        node: &CompiledForward,
        mapping: IndexMap<String, JsonValue>,
    ) -> Result<Vec<u8>, ForwardError> {
        debug!(node = %node.name, service = %node.service, target = node.target.kind(), "forwarding");
        match &node.target {
            CompiledTarget::Grpc { method } => {
                let params = JsonValue::Object(mapping.into_iter().collect());
                self.call_service(node, method, &params).await
            }
            CompiledTarget::Redis { value_type } => {
                let key = mapping.get("key").cloned().unwrap_or(JsonValue::Null);
                let params = serde_json::json!({ "key": key, "valType": value_type });
                self.call_service(node, "", &params).await
            }
            CompiledTarget::Http { url, method } => {
                let params = JsonValue::Object(mapping.into_iter().collect());
                self.call_http(node, url, method.as_str(), &params).await
            }
        }
    }
}
