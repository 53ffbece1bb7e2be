use std::collections::HashSet;

use crate::expressions::parse_predicate;
use crate::planner::scan::scan_forward;
use crate::planner::{build_forward_graph, GraphError};
use crate::types::{ApiEntry, ApiForward, ForwardTarget, TargetKind};
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_chain(v: &mut Validator, api: &ApiEntry, path: &str) {
    let names: HashSet<&str> = api.forwards.iter().map(|f| f.name.as_str()).collect();
    let params: HashSet<&str> = api.param_names().collect();

    let mut seen = HashSet::<&str>::new();
    let mut graph_ok = true;
    for (idx, fwd) in api.forwards.iter().enumerate() {
        let fpath = format!("{path}[{idx}]");
        if fwd.name.is_empty() {
            v.push(format!("{fpath}.name"), "is required");
            graph_ok = false;
        } else if !ID_RE.is_match(&fwd.name) {
            v.push(format!("{fpath}.name"), "must match regex [A-Za-z0-9_\\-]+");
        } else if !seen.insert(fwd.name.as_str()) {
            v.push(format!("{fpath}.name"), "must be unique within the forward chain");
            graph_ok = false;
        }

        validate_target(v, fwd, &fpath);

        for dep in &fwd.deps {
            if *dep == fwd.name {
                v.push(format!("{fpath}.deps"), "must not depend on itself");
                graph_ok = false;
            } else if !names.contains(dep.as_str()) {
                v.push(format!("{fpath}.deps"), format!("unknown dependency '{dep}'"));
                graph_ok = false;
            }
        }

        validate_mapping(v, fwd, &fpath, &params);

        if let Some(test) = &fwd.test {
            if let Err(e) = parse_predicate(test) {
                v.push(format!("{fpath}.test"), e.to_string());
            }
        }
    }

    if graph_ok {
        if let Err(GraphError::CyclicDependency(nodes)) = build_forward_graph(&api.forwards) {
            v.push(
                path,
                format!("cyclic dependency among forwards: {}", nodes.join(", ")),
            );
        }
    }
}

fn validate_target(v: &mut Validator, fwd: &ApiForward, path: &str) {
    let targets = fwd.targets();
    match targets.len() {
        0 => {
            v.push(path, "must declare one of grpc, redis or http");
            return;
        }
        1 => {}
        _ => v.push(path, "must declare exactly one of grpc, redis or http"),
    }

    let needs_service = !matches!(targets[0], ForwardTarget::Http(_));
    if needs_service && fwd.service.trim().is_empty() {
        v.push(format!("{path}.service"), "is required");
    }

    match targets[0] {
        ForwardTarget::Grpc(t) => {
            if t.method.trim().is_empty() {
                v.push(format!("{path}.grpc.method"), "is required");
            }
        }
        ForwardTarget::Redis(t) => {
            if t.key.trim().is_empty() {
                v.push(format!("{path}.redis.key"), "is required");
            }
            if t.value_type != "string" && t.value_type != "hash" {
                v.push(format!("{path}.redis.type"), "must be 'string' or 'hash'");
            }
        }
        ForwardTarget::Http(t) => {
            if !(t.url.starts_with("http://") || t.url.starts_with("https://")) {
                v.push(format!("{path}.http.url"), "must be an absolute http(s) url");
            }
            if let Some(m) = &t.method {
                if m.parse::<crate::types::HttpMethod>().is_err() {
                    v.push(format!("{path}.http.method"), format!("invalid method '{m}'"));
                }
            }
        }
    }
}

fn validate_mapping(v: &mut Validator, fwd: &ApiForward, path: &str, params: &HashSet<&str>) {
    let Some(target) = fwd.target() else {
        return;
    };
    let mpath = match target.kind() {
        TargetKind::Grpc => format!("{path}.grpc.paramMapper"),
        TargetKind::Redis => format!("{path}.redis"),
        TargetKind::Http => format!("{path}.http.paramMapper"),
    };

    let scan = scan_forward(fwd);
    for (dest, err) in &scan.errors {
        v.push(format!("{mpath}.{dest}"), err.to_string());
    }
    for (dest, expr) in &scan.mapping {
        for (node, _) in expr.node_refs() {
            if !fwd.deps.iter().any(|d| d == node) {
                v.push(
                    format!("{mpath}.{dest}"),
                    format!("references forward '{node}' which is not listed in deps"),
                );
            }
        }
        for field in expr.param_refs() {
            if !params.contains(field) {
                v.push(
                    format!("{mpath}.{dest}"),
                    format!("references undeclared parameter '{field}'"),
                );
            }
        }
    }
}
