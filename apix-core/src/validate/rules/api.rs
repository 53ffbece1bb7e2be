use crate::types::{ApiEntry, ReturnData, ReturnType};
use crate::validate::rules::{data_type, forward};
use crate::validate::validator::{Validator, STATUS_RE};

pub(crate) fn validate_api(v: &mut Validator, api: &ApiEntry, path: &str) {
    if api.url.trim().is_empty() {
        v.push(format!("{path}.url"), "is required");
    } else if !api.url.starts_with('/') {
        v.push(format!("{path}.url"), "must start with '/'");
    }

    if let Err(e) = api.http_method() {
        v.push(format!("{path}.method"), e);
    }

    for (source, members) in &api.params {
        data_type::validate_members(v, members, &format!("{path}.params.{source}"));
    }

    validate_returns(v, api, path);
    forward::validate_chain(v, api, &format!("{path}.forwards"));
}

fn validate_returns(v: &mut Validator, api: &ApiEntry, path: &str) {
    if api.returns.is_empty() {
        v.push(format!("{path}.returns"), "must declare at least one return");
        return;
    }
    for (status, ret) in &api.returns {
        let rpath = format!("{path}.returns.{status}");
        if !STATUS_RE.is_match(status) {
            v.push(&rpath, "status must be a three-digit http status code");
        }
        let kind = match ret.kind() {
            Ok(k) => k,
            Err(e) => {
                v.push(format!("{rpath}.type"), e);
                continue;
            }
        };
        match (&ret.data, kind) {
            (None, ReturnType::Json) => {
                v.push(format!("{rpath}.data"), "is required for json returns");
            }
            (Some(ReturnData::TypeName(name)), _) if !v.is_known_type(name) => {
                v.push(format!("{rpath}.data"), format!("unknown type '{name}'"));
            }
            (Some(ReturnData::Members(members)), _) => {
                data_type::validate_members(v, members, &format!("{rpath}.data"));
            }
            _ => {}
        }
    }
}
