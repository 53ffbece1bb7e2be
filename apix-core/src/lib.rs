#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod planner;
pub mod types;
pub mod validate;

pub use crate::error::{ApixError, ParseError, ValidationError, Violation};
pub use crate::parser::{parse_document_str, parse_str, DocumentFormat, ParsedDocument};
pub use crate::planner::{
    build_forward_graph, plan_document, plan_from_str, DependencyGraph, EndpointPlan, GraphError,
    Plan, PlanForward, PlanParam, PlanSummary, PlannerError, PlanningOutcome,
    ValidationSummary,
};
pub use crate::types::ApiDocument;
pub use crate::validate::{lint_document, validate_document, Validate};

/// Parses and validates a document in one step.
pub fn load_document(input: &str) -> Result<ApiDocument, ApixError> {
    let parsed = parse_document_str(input, DocumentFormat::Auto)?;
    validate_document(&parsed.document)?;
    Ok(parsed.document)
}
