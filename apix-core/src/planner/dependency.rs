use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::planner::model::DependencyGraph;
use crate::types::ApiForward;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("forward '{node}' depends on unknown forward '{dep}'")]
    UnknownDependency { node: String, dep: String },
    #[error("cyclic dependency among forwards: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),
}

/// Builds the dependency graph of one forward chain. Unknown deps and cycles are errors.
pub fn build_forward_graph(forwards: &[ApiForward]) -> Result<DependencyGraph, GraphError> {
    let names: BTreeSet<String> = forwards.iter().map(|f| f.name.clone()).collect();
    let mut depends_on: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for fwd in forwards {
        let mut deps = Vec::with_capacity(fwd.deps.len());
        for dep in &fwd.deps {
            if !names.contains(dep) {
                return Err(GraphError::UnknownDependency {
                    node: fwd.name.clone(),
                    dep: dep.clone(),
                });
            }
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }
        deps.sort();
        depends_on.entry(fwd.name.clone()).or_default().extend(deps);
    }

    let topo_order = topo_sort(&names, &depends_on)?;
    let levels = compute_levels(&topo_order, &depends_on);

    Ok(DependencyGraph {
        depends_on,
        levels,
        topo_order,
    })
}

fn topo_sort(
    nodes: &BTreeSet<String>,
    depends_on: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<String>, GraphError> {
    let mut indeg: BTreeMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (n, deps) in depends_on {
        for d in deps {
            if let Some(e) = indeg.get_mut(n.as_str()) {
                *e += 1;
            }
            outgoing.entry(d.as_str()).or_default().push(n.as_str());
        }
    }

    for v in outgoing.values_mut() {
        v.sort();
    }

    let mut q: VecDeque<&str> = indeg
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();

    let mut out = Vec::with_capacity(nodes.len());
    while let Some(n) = q.pop_front() {
        out.push(n.to_string());
        for m in outgoing.get(n).map(Vec::as_slice).unwrap_or(&[]) {
            if let Some(e) = indeg.get_mut(m) {
                *e -= 1;
                if *e == 0 {
                    q.push_back(m);
                }
            }
        }
    }

    if out.len() != nodes.len() {
        let stuck = indeg
            .into_iter()
            .filter(|(_, d)| *d > 0)
            .map(|(n, _)| n.to_string())
            .collect();
        return Err(GraphError::CyclicDependency(stuck));
    }
    Ok(out)
}

fn compute_levels(topo: &[String], depends_on: &BTreeMap<String, Vec<String>>) -> Vec<Vec<String>> {
    if topo.is_empty() {
        return Vec::new();
    }

    let mut level: BTreeMap<&str, usize> = BTreeMap::new();
    for node in topo {
        let deps = depends_on.get(node).map(Vec::as_slice).unwrap_or(&[]);
        let l = deps
            .iter()
            .filter_map(|d| level.get(d.as_str()).copied())
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        level.insert(node.as_str(), l);
    }

    let max_level = level.values().copied().max().unwrap_or(0);
    let mut levels = vec![Vec::<String>::new(); max_level + 1];
    for node in topo {
        if let Some(l) = level.get(node.as_str()) {
            levels[*l].push(node.clone());
        }
    }
    levels
}
