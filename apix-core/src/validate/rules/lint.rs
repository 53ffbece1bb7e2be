use std::collections::HashMap;

use crate::error::Violation;
use crate::types::{ApiDocument, ParamSource};

pub(crate) fn lint_document(doc: &ApiDocument) -> Vec<Violation> {
    let mut out = Vec::new();
    for (idx, api) in doc.apis.iter().enumerate() {
        let mut owner = HashMap::<&str, ParamSource>::new();
        for (source, members) in &api.params {
            for name in members.keys() {
                if let Some(prev) = owner.insert(name.as_str(), *source) {
                    out.push(Violation::new(
                        format!("$.apis[{idx}].params.{source}.{name}"),
                        format!("also declared in the '{prev}' group; the later group wins"),
                    ));
                }
            }
        }
    }
    out
}
