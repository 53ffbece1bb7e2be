use std::sync::Arc;

use apix_core::types::HttpMethod;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::binder::ParamReader;
use crate::compile::{ApiCode, CompileError, CompiledEndpoint};
use crate::forward::{ForwardEngine, Forwarder};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Response side of the HTTP layer.
pub trait ResponseWriter: Send {
    fn write_raw(&mut self, status: u16, content_type: &str, body: &[u8]);

    fn write_json(&mut self, status: u16, value: &JsonValue) {
        let body = serde_json::to_vec(value).unwrap_or_default();
        self.write_raw(status, CONTENT_TYPE_JSON, &body);
    }
}

/// Collects the response in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl ResponseWriter for BufferedResponse {
    fn write_raw(&mut self, status: u16, content_type: &str, body: &[u8]) {
        self.status = status;
        self.content_type = content_type.to_string();
        self.body = body.to_vec();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("api document name must not be empty")]
    EmptyName,
    #[error("api document '{0}' is empty")]
    EmptyContent(String),
    #[error("api document '{name}': {source}")]
    Compile {
        name: String,
        #[source]
        source: CompileError,
    },
    #[error("api document '{name}': {method} {url} is already served by '{owner}'")]
    RouteConflict {
        name: String,
        method: HttpMethod,
        url: String,
        owner: String,
    },
}

/// A route served by an installed document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EndpointInfo {
    pub document: String,
    pub method: HttpMethod,
    pub url: String,
    pub forwards: usize,
}

/// Installed API documents and the dispatcher that runs their endpoints.
pub struct Gateway {
    docs: RwLock<IndexMap<String, Arc<ApiCode>>>,
    forwarder: Arc<dyn Forwarder>,
}

impl Gateway {
    pub fn new(forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            docs: RwLock::new(IndexMap::new()),
            forwarder,
        }
    }

    /// Compiles `content` and installs it under `name`, replacing any previous
    /// document with that name. Nothing is installed when compilation fails.
    pub fn add_api_doc(&self, name: &str, content: &str) -> Result<(), GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::EmptyName);
        }
        if content.trim().is_empty() {
            return Err(GatewayError::EmptyContent(name.to_string()));
        }
        let code = ApiCode::parse(content).map_err(|source| GatewayError::Compile {
            name: name.to_string(),
            source,
        })?;

        let mut docs = self.docs.write();
        for (owner, other) in docs.iter().filter(|(n, _)| n.as_str() != name) {
            if let Some(ep) = code
                .endpoints
                .iter()
                .find(|ep| other.find(ep.method, &ep.url).is_some())
            {
                return Err(GatewayError::RouteConflict {
                    name: name.to_string(),
                    method: ep.method,
                    url: ep.url.clone(),
                    owner: owner.clone(),
                });
            }
        }
        let count = code.endpoints.len();
        let replaced = docs.insert(name.to_string(), Arc::new(code)).is_some();
        info!(document = %name, endpoints = count, replaced, "api document installed");
        Ok(())
    }

    pub fn remove_api_doc(&self, name: &str) -> bool {
        let removed = self.docs.write().shift_remove(name).is_some();
        if removed {
            info!(document = %name, "api document removed");
        }
        removed
    }

    pub fn endpoints(&self) -> Vec<EndpointInfo> {
        self.docs
            .read()
            .iter()
            .flat_map(|(doc, code)| {
                code.endpoints.iter().map(move |ep| EndpointInfo {
                    document: doc.clone(),
                    method: ep.method,
                    url: ep.url.clone(),
                    forwards: ep.chain.len(),
                })
            })
            .collect()
    }

    /// The compiled document serving `method url` and the endpoint's index in it.
    pub fn find(&self, method: HttpMethod, url: &str) -> Option<(Arc<ApiCode>, usize)> {
        self.docs.read().values().find_map(|code| {
            code.endpoints
                .iter()
                .position(|ep| ep.method == method && ep.url == url)
                .map(|idx| (Arc::clone(code), idx))
        })
    }

    /// Runs the request pipeline and writes the response. Returns the status written.
    pub async fn handle(
        &self,
        method: HttpMethod,
        url: &str,
        reader: &dyn ParamReader,
        writer: &mut dyn ResponseWriter,
    ) -> u16 {
        let Some((code, idx)) = self.find(method, url) else {
            debug!(%method, %url, "no route");
            return write_failure(writer, 404, "not found");
        };
        let Some(endpoint) = code.endpoints.get(idx) else {
            return write_failure(writer, 404, "not found");
        };
        self.run(endpoint, reader, writer).await
    }

    async fn run(
        &self,
        endpoint: &CompiledEndpoint,
        reader: &dyn ParamReader,
        writer: &mut dyn ResponseWriter,
    ) -> u16 {
        let params = match endpoint.binder.read_params(reader) {
            Ok(p) => p,
            Err(e) => {
                debug!(method = %endpoint.method, url = %endpoint.url, error = %e, "parameter binding failed");
                return write_failure(writer, 400, &e.to_string());
            }
        };

        let mut engine = ForwardEngine::new(&endpoint.chain, self.forwarder.as_ref(), &params);
        match engine.execute().await {
            Ok(body) if body.is_empty() => {
                writer.write_raw(204, CONTENT_TYPE_JSON, &[]);
                204
            }
            Ok(body) => {
                writer.write_raw(200, CONTENT_TYPE_JSON, &body);
                200
            }
            Err(e) => {
                warn!(method = %endpoint.method, url = %endpoint.url, node = e.node(), error = %e, "forward chain failed");
                write_failure(writer, 500, &e.to_string())
            }
        }
    }
}

fn write_failure(writer: &mut dyn ResponseWriter, status: u16, message: &str) -> u16 {
    writer.write_json(status, &json!({ "success": false, "error": message }));
    status
}
