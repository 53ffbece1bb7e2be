use std::collections::HashSet;

use crate::types::{url_join, ApiDocument, BUILTIN_TYPES};
use crate::validate::rules::{api, data_type};
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_document(v: &mut Validator, doc: &ApiDocument) {
    if doc.version.trim().is_empty() {
        v.push("$.version", "is required");
    }
    if doc.base_url.trim().is_empty() {
        v.push("$.baseUrl", "is required");
    }

    let mut type_names = HashSet::<&str>::new();
    for (idx, dt) in doc.types.iter().enumerate() {
        let path = format!("$.types[{idx}]");
        if dt.name.is_empty() {
            v.push(format!("{path}.name"), "is required");
        } else if !ID_RE.is_match(&dt.name) {
            v.push(format!("{path}.name"), "must match regex [A-Za-z0-9_\\-]+");
        } else if BUILTIN_TYPES.contains(&dt.name.as_str()) {
            v.push(format!("{path}.name"), "must not redefine a builtin type");
        } else if !type_names.insert(dt.name.as_str()) {
            v.push(format!("{path}.name"), "duplicate type name");
        }
        data_type::validate_data_type(v, dt, &path);
    }

    if doc.apis.is_empty() {
        v.push("$.apis", "must have at least one entry");
    }

    let mut routes = HashSet::<(String, String)>::new();
    for (idx, entry) in doc.apis.iter().enumerate() {
        let path = format!("$.apis[{idx}]");
        api::validate_api(v, entry, &path);

        if let Ok(method) = entry.http_method() {
            let route = (method.to_string(), url_join(&doc.base_url, &entry.url));
            if !entry.url.is_empty() && !routes.insert(route) {
                v.push(format!("{path}.url"), "method and url must be unique across apis");
            }
        }
    }
}
