use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::expressions::{parse_source_expr, SourceExpr, SourceExprError};
use crate::types::ApiForward;

#[derive(Debug, Default)]
pub(crate) struct ScanResult {
    pub mapping: IndexMap<String, SourceExpr>,
    pub errors: Vec<(String, SourceExprError)>,
    pub referenced_nodes: BTreeSet<String>,
    pub referenced_params: BTreeSet<String>,
}

/// Parses every source expression of a forward node and collects what they reference.
pub(crate) fn scan_forward(fwd: &ApiForward) -> ScanResult {
    let mut out = ScanResult::default();
    for (dest, raw) in fwd.mapping() {
        match parse_source_expr(raw) {
            Ok(expr) => {
                out.referenced_nodes
                    .extend(expr.node_refs().map(|(node, _)| node.to_string()));
                out.referenced_params
                    .extend(expr.param_refs().map(str::to_string));
                out.mapping.insert(dest.to_string(), expr);
            }
            Err(e) => out.errors.push((dest.to_string(), e)),
        }
    }
    out
}
