//! Edge-level graph content checks.
//!
//! Each check returns `(valid, offenders)` instead of failing, so callers can
//! gather several problems before deciding what to do.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

/// Edges with an endpoint that is not a node, in edge order.
pub fn validate_nodes_for_edges<T>(node_ids: &[T], edge_ids: &[[T; 2]]) -> (bool, Vec<[T; 2]>)
where
    T: Copy + Eq + Hash,
{
    let nodes: FxHashSet<T> = node_ids.iter().copied().collect();
    let invalid: Vec<[T; 2]> = edge_ids
        .iter()
        .filter(|[source, target]| !nodes.contains(source) || !nodes.contains(target))
        .copied()
        .collect();
    (invalid.is_empty(), invalid)
}

/// Sorted, unique ids of nodes with an edge to themselves.
pub fn validate_no_self_edges<T>(edge_ids: &[[T; 2]]) -> (bool, Vec<T>)
where
    T: Copy + Ord,
{
    let mut nodes: Vec<T> = edge_ids
        .iter()
        .filter(|[source, target]| source == target)
        .map(|[source, _]| *source)
        .collect();
    nodes.sort_unstable();
    nodes.dedup();
    (nodes.is_empty(), nodes)
}

/// Sorted, unique edges that appear more than once.
///
/// Edges are compared as ordered `(source, target)` rows.
pub fn validate_no_repeated_edges<T>(edge_ids: &[[T; 2]]) -> (bool, Vec<[T; 2]>)
where
    T: Copy + Ord + Hash,
{
    let mut counts: FxHashMap<[T; 2], usize> = FxHashMap::default();
    for edge in edge_ids {
        *counts.entry(*edge).or_default() += 1;
    }
    let mut repeated: Vec<[T; 2]> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(edge, _)| edge)
        .collect();
    repeated.sort_unstable();
    (repeated.is_empty(), repeated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_for_edges() {
        let nodes = [0i64, 1, 2];
        assert_eq!(
            validate_nodes_for_edges(&nodes, &[[0, 1], [1, 2]]),
            (true, vec![])
        );
        assert_eq!(
            validate_nodes_for_edges(&nodes, &[[0, 5], [1, 2], [7, 0]]),
            (false, vec![[0, 5], [7, 0]])
        );
        assert_eq!(validate_nodes_for_edges::<i64>(&[], &[]), (true, vec![]));
    }

    #[test]
    fn test_self_edges() {
        assert_eq!(validate_no_self_edges(&[[0i64, 0], [1, 2]]), (false, vec![0]));
        assert_eq!(
            validate_no_self_edges(&[[3u32, 3], [1, 1], [3, 3]]),
            (false, vec![1, 3])
        );
        assert_eq!(validate_no_self_edges(&[[0i64, 1]]), (true, vec![]));
    }

    #[test]
    fn test_repeated_edges() {
        assert_eq!(
            validate_no_repeated_edges(&[[0i64, 1], [0, 1], [1, 2]]),
            (false, vec![[0, 1]])
        );
        assert_eq!(
            validate_no_repeated_edges(&[[0i64, 1], [1, 0]]),
            (true, vec![])
        );
        assert_eq!(
            validate_no_repeated_edges(&[[5i64, 6], [1, 2], [5, 6], [1, 2], [5, 6]]),
            (false, vec![[1, 2], [5, 6]])
        );
    }
}
