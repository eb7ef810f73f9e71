//! Tracklet and lineage consistency checks.
//!
//! A tracklet is a run of nodes without divisions: its in-group edges must
//! form one simple directed path. A lineage is everything descended from one
//! root: it must be exactly one weakly connected component of the graph.
//! Problems are collected as messages rather than returned as errors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

/// Checks that each tracklet is a single simple directed path.
///
/// `tracklet_ids[i]` is the tracklet of `node_ids[i]`. Edges between
/// different tracklets are ignored.
pub fn validate_tracklets<T, G>(node_ids: &[T], edge_ids: &[[T; 2]], tracklet_ids: &[G]) -> (bool, Vec<String>)
where
    T: Copy + Eq + Hash + Display,
    G: Copy + Eq + Hash + Ord + Display,
{
    if let Some(err) = length_error("tracklet", node_ids.len(), tracklet_ids.len()) {
        return (false, vec![err]);
    }
    let group_of: FxHashMap<T, G> = node_ids.iter().copied().zip(tracklet_ids.iter().copied()).collect();
    let mut members: BTreeMap<G, Vec<T>> = BTreeMap::new();
    for (&node, &group) in node_ids.iter().zip(tracklet_ids) {
        members.entry(group).or_default().push(node);
    }

    let mut predecessors: FxHashMap<T, usize> = FxHashMap::default();
    let mut successors: FxHashMap<T, Vec<T>> = FxHashMap::default();
    for &[source, target] in edge_ids {
        match (group_of.get(&source), group_of.get(&target)) {
            (Some(a), Some(b)) if a == b => {
                *predecessors.entry(target).or_default() += 1;
                successors.entry(source).or_default().push(target);
            }
            _ => {}
        }
    }
    let out_degree = |node: &T| successors.get(node).map_or(0, Vec::len);
    let in_degree = |node: &T| predecessors.get(node).copied().unwrap_or(0);

    let mut errors = Vec::new();
    for (group, nodes) in &members {
        let starts: Vec<T> = nodes.iter().copied().filter(|n| in_degree(n) == 0).collect();
        let ends = nodes.iter().filter(|n| out_degree(n) == 0).count();
        let before = errors.len();
        if starts.len() != 1 {
            errors.push(format!(
                "Tracklet {group}: expected exactly one start node, found {}",
                starts.len()
            ));
        }
        if ends != 1 {
            errors.push(format!("Tracklet {group}: expected exactly one end node, found {ends}"));
        }
        for node in nodes {
            if in_degree(node) > 1 {
                errors.push(format!("Tracklet {group}: node {node} has more than one predecessor"));
            }
            if out_degree(node) > 1 {
                errors.push(format!("Tracklet {group}: node {node} has more than one successor"));
            }
        }
        if errors.len() > before {
            continue;
        }

        let start = starts[0];
        let mut visited = FxHashSet::default();
        let mut current = Some(start);
        while let Some(node) = current {
            if !visited.insert(node) {
                break;
            }
            current = successors.get(&node).and_then(|next| next.first().copied());
        }
        if visited.len() != nodes.len() {
            errors.push(format!(
                "Tracklet {group}: only {} of {} nodes are reachable from start node {start}",
                visited.len(),
                nodes.len()
            ));
        }
    }
    (errors.is_empty(), errors)
}

/// Checks that each lineage is exactly one weakly connected component.
///
/// `lineage_ids[i]` is the lineage of `node_ids[i]`. Edges with an unknown
/// endpoint are ignored.
pub fn validate_lineages<T, G>(node_ids: &[T], edge_ids: &[[T; 2]], lineage_ids: &[G]) -> (bool, Vec<String>)
where
    T: Copy + Eq + Hash + Display,
    G: Copy + Eq + Hash + Ord + Display,
{
    if let Some(err) = length_error("lineage", node_ids.len(), lineage_ids.len()) {
        return (false, vec![err]);
    }
    let index: FxHashMap<T, usize> = node_ids.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let mut components = DisjointSet::new(node_ids.len());
    for [source, target] in edge_ids {
        if let (Some(&a), Some(&b)) = (index.get(source), index.get(target)) {
            components.union(a, b);
        }
    }

    let mut lineage_components: BTreeMap<G, BTreeSet<usize>> = BTreeMap::new();
    let mut component_lineages: BTreeMap<usize, BTreeSet<G>> = BTreeMap::new();
    for (i, &lineage) in lineage_ids.iter().enumerate() {
        let root = components.find(i);
        lineage_components.entry(lineage).or_default().insert(root);
        component_lineages.entry(root).or_default().insert(lineage);
    }

    let mut errors = Vec::new();
    for (lineage, roots) in &lineage_components {
        if roots.len() > 1 {
            errors.push(format!(
                "Lineage {lineage} is split across {} connected components",
                roots.len()
            ));
        }
    }
    for lineages in component_lineages.values() {
        if lineages.len() > 1 {
            let names: Vec<String> = lineages.iter().map(ToString::to_string).collect();
            errors.push(format!(
                "Lineages {} share one connected component",
                names.join(", ")
            ));
        }
    }
    (errors.is_empty(), errors)
}

fn length_error(kind: &str, nodes: usize, groups: usize) -> Option<String> {
    (nodes != groups).then(|| format!("Expected one {kind} id per node: {nodes} nodes but {groups} {kind} ids"))
}

/// Union-find over `0..n` with path halving.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a != b {
            self.parent[b] = a;
        }
    }
}
