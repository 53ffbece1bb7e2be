mod dependency;
mod format;
mod model;
pub(crate) mod scan;

use crate::error::ParseError;
use crate::expressions::parse_predicate;
use crate::parser::{parse_document_str, DocumentFormat};
use crate::types::{url_join, ApiDocument, ApiEntry};
use crate::validate::{lint_document, validate_document};

pub use dependency::{build_forward_graph, GraphError};
pub use format::format_mapping;
pub use model::{
    DependencyGraph, EndpointPlan, Plan, PlanForward, PlanParam, PlanSummary, PlanningOutcome,
    ValidationSummary,
};

pub fn plan_from_str(input: &str, doc_format: DocumentFormat) -> Result<PlanningOutcome, PlannerError> {
    let parsed = parse_document_str(input, doc_format)?;
    plan_document(&parsed.document)
}

pub fn plan_document(doc: &ApiDocument) -> Result<PlanningOutcome, PlannerError> {
    let warnings = lint_document(doc);
    let validation = match validate_document(doc) {
        Ok(()) => ValidationSummary::valid(warnings),
        Err(e) => ValidationSummary::invalid_from(e, warnings),
    };

    if !validation.is_valid {
        return Ok(PlanningOutcome {
            validation,
            plan: None,
        });
    }

    let endpoints = doc
        .apis
        .iter()
        .map(|api| plan_endpoint(doc, api))
        .collect::<Result<Vec<_>, _>>()?;

    let plan = Plan {
        summary: PlanSummary {
            version: doc.version.clone(),
            base_url: doc.base_url.clone(),
            endpoint_count: endpoints.len(),
            forward_count: endpoints.iter().map(|e| e.forwards.len()).sum(),
        },
        endpoints,
    };
    Ok(PlanningOutcome {
        validation,
        plan: Some(plan),
    })
}

fn plan_endpoint(doc: &ApiDocument, api: &ApiEntry) -> Result<EndpointPlan, PlannerError> {
    let method = api.http_method().map_err(PlannerError::Endpoint)?;
    let url = url_join(&doc.base_url, &api.url);
    let graph = build_forward_graph(&api.forwards)?;

    let params = api
        .params
        .iter()
        .flat_map(|(source, members)| {
            members.iter().map(|(name, attr)| PlanParam {
                source: *source,
                name: name.clone(),
                r#type: attr.ty.to_string(),
                required: attr.required,
            })
        })
        .collect();

    let mut forwards = Vec::with_capacity(api.forwards.len());
    for fwd in &api.forwards {
        let scan = scan::scan_forward(fwd);
        if let Some((dest, err)) = scan.errors.into_iter().next() {
            return Err(PlannerError::Endpoint(format!(
                "{method} {url}: forward '{}' field '{dest}': {err}",
                fwd.name
            )));
        }
        let test = match &fwd.test {
            Some(t) => parse_predicate(t)
                .map_err(|e| PlannerError::Endpoint(format!("forward '{}': {e}", fwd.name)))?
                .clauses
                .iter()
                .map(ToString::to_string)
                .collect(),
            None => Vec::new(),
        };
        let target = fwd
            .target()
            .map(|t| t.kind())
            .ok_or_else(|| PlannerError::Endpoint(format!("forward '{}' has no target", fwd.name)))?;

        forwards.push(PlanForward {
            name: fwd.name.clone(),
            service: fwd.service.clone(),
            target,
            depends_on: graph.depends_on.get(&fwd.name).cloned().unwrap_or_default(),
            on_fail: fwd.on_fail,
            mapping: scan.mapping,
            test,
        });
    }

    Ok(EndpointPlan {
        method,
        url,
        params,
        graph,
        forwards,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to build forward dependency graph: {0}")]
    DependencyGraph(#[from] GraphError),

    #[error("{0}")]
    Endpoint(String),
}
