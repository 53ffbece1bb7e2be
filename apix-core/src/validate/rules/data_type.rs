use indexmap::IndexMap;

use crate::types::{DataType, MemberAttr};
use crate::validate::validator::Validator;

pub(crate) fn validate_data_type(v: &mut Validator, dt: &DataType, path: &str) {
    if dt.members.is_empty() {
        v.push(format!("{path}.members"), "must have at least one member");
    }
    validate_members(v, &dt.members, &format!("{path}.members"));
}

pub(crate) fn validate_members(v: &mut Validator, members: &IndexMap<String, MemberAttr>, path: &str) {
    for (name, attr) in members {
        if name.trim().is_empty() {
            v.push(path, "member name must not be empty");
            continue;
        }
        validate_member(v, attr, &format!("{path}.{name}"));
    }
}

pub(crate) fn validate_member(v: &mut Validator, attr: &MemberAttr, path: &str) {
    let tpath = format!("{path}.type");
    match attr.ty.base_name() {
        None => v.push(
            &tpath,
            "malformed type (expected a type name or a one-element list)",
        ),
        Some(name) if !v.is_known_type(name) => {
            v.push(&tpath, format!("unknown type '{name}'"));
        }
        Some(_) => {}
    }
    if attr.ty.is_nested_array() {
        v.push(&tpath, "nested arrays are not supported");
    }

    if !attr.has_length_constraints() {
        return;
    }
    let sized = attr.ty.is_array() || attr.ty.base_name() == Some("string");
    if !sized {
        v.push(path, "length constraints only apply to strings and arrays");
    }
    if let (Some(min), Some(max)) = (attr.min_length, attr.max_length) {
        if min > max {
            v.push(format!("{path}.minLength"), "must not exceed maxLength");
        }
    }
    if let Some(len) = attr.length {
        if attr.min_length.is_some_and(|min| len < min) || attr.max_length.is_some_and(|max| len > max) {
            v.push(format!("{path}.length"), "conflicts with minLength/maxLength");
        }
    }
}
