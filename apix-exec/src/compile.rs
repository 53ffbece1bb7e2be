use std::sync::Arc;

use apix_core::types::{url_join, ApiDocument, HttpMethod};
use apix_core::{parse_document_str, validate_document, DocumentFormat, ParseError, ValidationError};
use tracing::debug;

use crate::binder::ParamBinder;
use crate::forward::{ForwardChain, ForwardError};
use crate::types::{SchemaError, TypeRegistry};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("api {method} {url}: {message}")]
    Endpoint {
        method: String,
        url: String,
        message: String,
    },
    #[error("api {url}: {source}")]
    Forward {
        url: String,
        #[source]
        source: ForwardError,
    },
}

/// One endpoint ready to serve: its route, parameter binder and forward chain.
#[derive(Debug, Clone)]
pub struct CompiledEndpoint {
    pub method: HttpMethod,
    pub url: String,
    pub binder: ParamBinder,
    pub chain: ForwardChain,
}

/// Every endpoint of one document, compiled against its type registry.
#[derive(Debug, Clone)]
pub struct ApiCode {
    pub version: String,
    pub registry: Arc<TypeRegistry>,
    pub endpoints: Vec<CompiledEndpoint>,
}

impl ApiCode {
    /// Parses, validates and compiles a document. Any error rejects the whole document.
    pub fn parse(input: &str) -> Result<Self, CompileError> {
        let parsed = parse_document_str(input, DocumentFormat::Auto)?;
        Self::compile(&parsed.document)
    }

    pub fn compile(doc: &ApiDocument) -> Result<Self, CompileError> {
        validate_document(doc)?;
        let registry = Arc::new(TypeRegistry::from_types(&doc.types)?);

        let mut endpoints = Vec::with_capacity(doc.apis.len());
        for api in &doc.apis {
            let method = api.http_method().map_err(|message| CompileError::Endpoint {
                method: api.method.clone().unwrap_or_default(),
                url: api.url.clone(),
                message,
            })?;
            let url = url_join(&doc.base_url, &api.url);
            let chain = ForwardChain::compile(&api.forwards).map_err(|source| {
                CompileError::Forward {
                    url: url.clone(),
                    source,
                }
            })?;
            debug!(%method, %url, forwards = chain.len(), "compiled endpoint");
            endpoints.push(CompiledEndpoint {
                method,
                binder: ParamBinder::new(Arc::clone(&registry), &api.params),
                url,
                chain,
            });
        }

        Ok(Self {
            version: doc.version.clone(),
            registry,
            endpoints,
        })
    }

    pub fn find(&self, method: HttpMethod, url: &str) -> Option<&CompiledEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.method == method && e.url == url)
    }
}
