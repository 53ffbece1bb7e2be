use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::error::{ValidationError, Violation};
use crate::expressions::SourceExpr;
use crate::types::{HttpMethod, OnFail, ParamSource, TargetKind};

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanningOutcome {
    pub validation: ValidationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationSummary {
    pub fn valid(warnings: Vec<Violation>) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn invalid_from(err: ValidationError, warnings: Vec<Violation>) -> Self {
        Self {
            is_valid: false,
            errors: err.lines(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Plan {
    pub summary: PlanSummary,
    pub endpoints: Vec<EndpointPlan>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanSummary {
    pub version: String,
    pub base_url: String,
    pub endpoint_count: usize,
    pub forward_count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EndpointPlan {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<PlanParam>,
    pub graph: DependencyGraph,
    pub forwards: Vec<PlanForward>,
}

impl EndpointPlan {
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanParam {
    pub source: ParamSource,
    pub name: String,
    pub r#type: String,
    pub required: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlanForward {
    pub name: String,
    pub service: String,
    pub target: TargetKind,
    pub depends_on: Vec<String>,
    pub on_fail: OnFail,
    pub mapping: IndexMap<String, SourceExpr>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DependencyGraph {
    /// For each forward, which forwards it depends on.
    pub depends_on: BTreeMap<String, Vec<String>>,
    /// Forwards grouped by dependency depth.
    pub levels: Vec<Vec<String>>,
    /// A deterministic topological order.
    pub topo_order: Vec<String>,
}

impl DependencyGraph {
    pub fn to_dot(&self, label: &str) -> String {
        let mut out = String::new();
        out.push_str("digraph apix {\n");
        out.push_str(&format!("  label=\"{}\";\n", label.replace('"', "\\\"")));
        out.push_str("  labelloc=t;\n");
        out.push_str("  rankdir=LR;\n");

        for (node, deps) in &self.depends_on {
            if deps.is_empty() {
                out.push_str(&format!("  \"{node}\";\n"));
            } else {
                for dep in deps {
                    out.push_str(&format!("  \"{dep}\" -> \"{node}\";\n"));
                }
            }
        }

        for level in &self.levels {
            if level.len() > 1 {
                out.push_str("  { rank=same; ");
                for s in level {
                    out.push_str(&format!("\"{s}\"; "));
                }
                out.push_str("}\n");
            }
        }

        out.push_str("}\n");
        out
    }
}
