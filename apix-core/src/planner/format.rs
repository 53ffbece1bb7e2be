use indexmap::IndexMap;

use crate::expressions::SourceExpr;

/// `dest <- a | node.b | "fmt"` lines for the text rendering of a plan.
pub fn format_mapping(mapping: &IndexMap<String, SourceExpr>) -> Vec<String> {
    mapping
        .iter()
        .map(|(dest, expr)| {
            let mut parts: Vec<String> = expr.refs.iter().map(ToString::to_string).collect();
            if let Some(fmt) = &expr.format {
                parts.push(format!("{:?}", fmt.raw));
            }
            format!("{dest} <- {}", parts.join(" | "))
        })
        .collect()
}
