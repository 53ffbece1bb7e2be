use std::collections::HashMap;

use apix_core::expressions::{parse_predicate, parse_source_expr, Predicate, SourceExpr};
use apix_core::types::{ApiForward, ForwardTarget, HttpMethod, OnFail};
use apix_core::{build_forward_graph, GraphError};
use indexmap::IndexMap;

use super::ForwardError;

/// Transport details of a compiled node.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledTarget {
    Grpc { method: String },
    Redis { value_type: String },
    Http { url: url::Url, method: HttpMethod },
}

impl CompiledTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Grpc { .. } => "grpc",
            Self::Redis { .. } => "redis",
            Self::Http { .. } => "http",
        }
    }
}

/// A forward node with its expressions parsed once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledForward {
    pub name: String,
    pub service: String,
    pub target: CompiledTarget,
    pub deps: Vec<String>,
    pub mapping: IndexMap<String, SourceExpr>,
    pub predicate: Option<Predicate>,
    pub on_fail: OnFail,
}

impl CompiledForward {
    pub fn compile(fwd: &ApiForward) -> Result<Self, ForwardError> {
        let node = || fwd.name.clone();
        let target = match fwd.target() {
            Some(ForwardTarget::Grpc(t)) => CompiledTarget::Grpc {
                method: t.method.clone(),
            },
            Some(ForwardTarget::Redis(t)) => CompiledTarget::Redis {
                value_type: t.value_type.clone(),
            },
            Some(ForwardTarget::Http(t)) => {
                let url = url::Url::parse(&t.url).map_err(|e| ForwardError::Http {
                    node: node(),
                    message: format!("invalid url '{}': {e}", t.url),
                })?;
                let method = match t.method.as_deref() {
                    Some(m) => m.parse().map_err(|message| ForwardError::Http {
                        node: node(),
                        message,
                    })?,
                    None => HttpMethod::Post,
                };
                CompiledTarget::Http { url, method }
            }
            None => return Err(ForwardError::MissingTarget { node: node() }),
        };

        let mut mapping = IndexMap::new();
        for (dest, src) in fwd.mapping() {
            let expr = parse_source_expr(src).map_err(|e| ForwardError::InvalidSourceExpression {
                node: node(),
                field: dest.to_string(),
                message: e.to_string(),
            })?;
            mapping.insert(dest.to_string(), expr);
        }

        let predicate = fwd
            .test
            .as_ref()
            .map(parse_predicate)
            .transpose()
            .map_err(|e| ForwardError::InvalidPredicate {
                node: node(),
                message: e.to_string(),
            })?;

        Ok(Self {
            name: fwd.name.clone(),
            service: fwd.service.clone(),
            target,
            deps: fwd.deps.clone(),
            mapping,
            predicate,
            on_fail: fwd.on_fail,
        })
    }
}

/// The forward chain of one endpoint, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardChain {
    nodes: Vec<CompiledForward>,
    index: HashMap<String, usize>,
}

impl ForwardChain {
    /// Compiles every node and rejects unknown dependencies and cycles.
    pub fn compile(forwards: &[ApiForward]) -> Result<Self, ForwardError> {
        build_forward_graph(forwards).map_err(|e| match e {
            GraphError::UnknownDependency { node, dep } => {
                ForwardError::UnknownDependency { node, dep }
            }
            GraphError::CyclicDependency(nodes) => ForwardError::CyclicDependency {
                node: nodes.join(", "),
            },
        })?;
        let nodes = forwards
            .iter()
            .map(CompiledForward::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(nodes))
    }

    /// Builds a chain without graph checks. The engine still refuses cycles at run time.
    pub fn new(nodes: Vec<CompiledForward>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.clone(), i))
            .collect();
        Self { nodes, index }
    }

    pub fn nodes(&self) -> &[CompiledForward] {
        &self.nodes
    }

    pub fn get(&self, name: &str) -> Option<&CompiledForward> {
        self.index.get(name).and_then(|i| self.nodes.get(*i))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
