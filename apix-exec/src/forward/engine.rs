use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use apix_core::expressions::FieldRef;
use apix_core::types::OnFail;
use futures_util::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::{CompiledForward, ForwardChain, ForwardError, ForwardResult, Forwarder};
use crate::types::Variable;

/// Per-request executor of one forward chain. Nodes run one at a time in
/// declaration order, each after its dependencies, and each at most once.
pub struct ForwardEngine<'a> {
    chain: &'a ForwardChain,
    forwarder: &'a dyn Forwarder,
    params: JsonValue,
    results: HashMap<String, Arc<ForwardResult>>,
    in_progress: HashSet<String>,
}

impl<'a> ForwardEngine<'a> {
    pub fn new(chain: &'a ForwardChain, forwarder: &'a dyn Forwarder, params: &Variable) -> Self {
        Self {
            chain,
            forwarder,
            params: params.to_value(),
            results: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Runs the whole chain and returns the last declared node's result. An
    /// empty chain yields an empty body.
    pub async fn execute(&mut self) -> Result<Vec<u8>, ForwardError> {
        let chain = self.chain;
        for node in chain.nodes() {
            if !self.results.contains_key(&node.name) {
                self.run_node(&node.name).await?;
            }
        }
        match chain.nodes().last() {
            Some(last) => match self.results.get(&last.name) {
                Some(result) => result.to_result(),
                None => Ok(Vec::new()),
            },
            None => Ok(Vec::new()),
        }
    }

    pub fn result(&self, name: &str) -> Option<&Arc<ForwardResult>> {
        self.results.get(name)
    }

    /// Executes `name` after its dependencies. `Err` aborts the chain: a
    /// rejecting node failed, or the graph is broken.
    fn run_node<'s>(
        &'s mut self,
        name: &'s str,
    ) -> BoxFuture<'s, Result<Arc<ForwardResult>, ForwardError>> {
        async move {
            if let Some(done) = self.results.get(name) {
                return Ok(Arc::clone(done));
            }
            let chain = self.chain;
            let node = chain.get(name).ok_or_else(|| ForwardError::UnresolvedSourceReference {
                node: name.to_string(),
                reference: name.to_string(),
            })?;
            if !self.in_progress.insert(node.name.clone()) {
                return Err(ForwardError::CyclicDependency {
                    node: node.name.clone(),
                });
            }

            for dep in &node.deps {
                if self.results.contains_key(dep) {
                    continue;
                }
                if chain.get(dep).is_none() {
                    return Err(ForwardError::UnknownDependency {
                        node: node.name.clone(),
                        dep: dep.clone(),
                    });
                }
                self.run_node(dep).await?;
            }

            let result = match self.resolve_mapping(node) {
                Ok(mapping) => {
                    debug!(node = %node.name, fields = mapping.len(), "running forward");
                    match self.forwarder.forward(node, mapping).await {
                        Ok(bytes) => ForwardResult::ok(bytes),
                        Err(e) => ForwardResult::failed(e),
                    }
                }
                Err(e) => ForwardResult::failed(e),
            };
            let result = Arc::new(result);
            self.results.insert(node.name.clone(), Arc::clone(&result));
            self.in_progress.remove(&node.name);

            if let Some(error) = failure_of(node, &result) {
                match node.on_fail {
                    OnFail::Reject => {
                        warn!(node = %node.name, error = %error, "forward rejected, aborting chain");
                        return Err(error);
                    }
                    OnFail::Continue => {
                        warn!(node = %node.name, error = %error, "forward failed, continuing");
                    }
                }
            } else {
                debug!(node = %node.name, bytes = result.bytes.len(), "forward succeeded");
            }
            Ok(result)
        }
        .boxed()
    }

    fn resolve_mapping(
        &self,
        node: &CompiledForward,
    ) -> Result<IndexMap<String, JsonValue>, ForwardError> {
        let mut out = IndexMap::with_capacity(node.mapping.len());
        for (dest, expr) in &node.mapping {
            let mut values = Vec::with_capacity(expr.refs.len());
            for r in &expr.refs {
                values.push(self.resolve_ref(node, r)?);
            }
            out.insert(dest.clone(), expr.combine(values));
        }
        Ok(out)
    }

    fn resolve_ref(&self, node: &CompiledForward, r: &FieldRef) -> Result<JsonValue, ForwardError> {
        match r {
            // absent optional parameters are left out of the bound object
            FieldRef::Param { field } => Ok(self.params.get(field).cloned().unwrap_or(JsonValue::Null)),
            FieldRef::Node { node: dep, field } => {
                let unresolved = || ForwardError::UnresolvedSourceReference {
                    node: node.name.clone(),
                    reference: r.to_string(),
                };
                let result = self.results.get(dep).ok_or_else(unresolved)?;
                if let Some(e) = &result.error {
                    return Err(e.clone());
                }
                result.field(field).cloned().ok_or_else(unresolved)
            }
        }
    }
}

/// The error that makes `result` a failure of `node`, if any.
fn failure_of(node: &CompiledForward, result: &ForwardResult) -> Option<ForwardError> {
    if let Some(e) = &result.error {
        return Some(e.clone());
    }
    let predicate = node.predicate.as_ref()?;
    let passed = result.json().is_some_and(|body| predicate.evaluate(body));
    (!passed).then(|| ForwardError::PredicateEvaluationFailure {
        node: node.name.clone(),
    })
}
