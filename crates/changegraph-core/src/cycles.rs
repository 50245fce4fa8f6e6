//! Cycle detection and topological ordering
//!
//! Cycles are the strongly connected components of the edge relation that
//! hold more than one node, or a single node depending on itself. Every
//! elementary cycle lies inside exactly one such component, so reporting one
//! entry per component never omits a cycle. Members are listed in node
//! insertion order and components by their first member.
//!
//! Ordering runs off an iterative three-color depth-first traversal whose
//! post-order lists dependencies before their dependents (leaves first). Roots
//! are taken in node insertion order, and each node's dependencies in edge
//! order, so results are reproducible for identical input. Edge targets
//! without a node are leaves and are never entered.

use std::collections::HashSet;

use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{AnalysisError, Result};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Traversal {
    /// A back edge was seen.
    cyclic: bool,
    post_order: Vec<usize>,
}

/// Depth-first traversal over the nodes listed in `roots`. When `within` is
/// set, edges leaving that subset are ignored.
fn traverse(
    graph: &DependencyGraph,
    roots: &[usize],
    within: Option<&HashSet<usize>>,
) -> Traversal {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut cyclic = false;
    let mut post_order = Vec::with_capacity(roots.len());
    // (node, index of the next dependency to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &root in roots {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::InProgress;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let deps = graph.dependencies_at(node);

            if cursor == deps.len() {
                marks[node] = Mark::Done;
                post_order.push(node);
                stack.pop();
                continue;
            }
            frame.1 += 1;

            let Some(next) = graph.position(&deps[cursor]) else {
                continue;
            };
            if within.is_some_and(|subset| !subset.contains(&next)) {
                continue;
            }

            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => cyclic = true,
                Mark::Done => {}
            }
        }
    }

    Traversal { cyclic, post_order }
}

fn all_roots(graph: &DependencyGraph) -> Vec<usize> {
    (0..graph.len()).collect()
}

/// One entry per cyclic component. A graph has a cycle exactly when this is
/// non-empty, and every node on any cycle appears in exactly one entry.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    cyclic_components(graph)
}

/// Leaves-first order of all nodes, or `CycleBlockingSort` with every cycle
/// when any exists. Never returns a partial order.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>> {
    let traversal = traverse(graph, &all_roots(graph), None);
    if traversal.cyclic {
        return Err(AnalysisError::CycleBlockingSort {
            cycles: graph.cycles().to_vec(),
        });
    }

    Ok(traversal
        .post_order
        .into_iter()
        .map(|i| graph.node_at(i).path.clone())
        .collect())
}

/// Leaves-first order of `members`, considering only edges between them.
/// Members that are not graph nodes keep their relative position at the
/// front. `None` when the members form a cycle among themselves.
pub fn order_within(graph: &DependencyGraph, members: &[String]) -> Option<Vec<String>> {
    let mut order: Vec<String> = members
        .iter()
        .filter(|m| !graph.contains(m.as_str()))
        .cloned()
        .collect();

    let roots: Vec<usize> = members.iter().filter_map(|m| graph.position(m)).collect();
    let subset: HashSet<usize> = roots.iter().copied().collect();
    let traversal = traverse(graph, &roots, Some(&subset));
    if traversal.cyclic {
        return None;
    }

    order.extend(
        traversal
            .post_order
            .into_iter()
            .map(|i| graph.node_at(i).path.clone()),
    );
    Some(order)
}

/// Strongly connected components that contain a cycle: more than one node,
/// or a single node depending on itself.
pub fn cyclic_components(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut inner: DiGraph<usize, ()> = DiGraph::new();
    let indices: Vec<NodeIndex> = (0..graph.len()).map(|i| inner.add_node(i)).collect();

    for (from, &from_idx) in indices.iter().enumerate() {
        for dep in graph.dependencies_at(from) {
            if let Some(to) = graph.position(dep) {
                inner.add_edge(from_idx, indices[to], ());
            }
        }
    }

    let mut components: Vec<Vec<usize>> = algo::tarjan_scc(&inner)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| inner.contains_edge(idx, idx))
        })
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(|idx| inner[idx]).collect();
            members.sort_unstable();
            members
        })
        .collect();
    // tarjan_scc yields reverse topological order; report by first member
    components.sort_unstable_by_key(|members| members[0]);

    components
        .into_iter()
        .map(|members| {
            members
                .into_iter()
                .map(|i| graph.node_at(i).path.clone())
                .collect()
        })
        .collect()
}

/// Paths of every node that lies on at least one cycle.
pub fn cycle_members(graph: &DependencyGraph) -> HashSet<String> {
    graph.cycles().iter().flatten().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraphBuilder;

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut builder = DependencyGraphBuilder::new();
        for (from, to) in edges {
            builder.add_dependency(from, to);
        }
        builder.build()
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&[("x.ts", "y.ts"), ("y.ts", "x.ts")]);
        assert_eq!(detect_cycles(&g), vec![vec!["x.ts".to_string(), "y.ts".to_string()]]);
        assert!(g.is_in_cycle("x.ts"));
        assert!(g.is_in_cycle("y.ts"));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let g = graph(&[("a.ts", "a.ts"), ("b.ts", "a.ts")]);
        assert_eq!(g.cycles(), [vec!["a.ts".to_string()]]);
        assert!(g.is_in_cycle("a.ts"));
        assert!(!g.is_in_cycle("b.ts"));
    }

    #[test]
    fn test_cycle_reached_through_chord_is_reported() {
        // a → c → a is found first; a → b → c → a must still show up
        let g = graph(&[("a", "c"), ("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(g.cycles(), [vec!["a".to_string(), "b".to_string(), "c".to_string()]]);
        assert!(g.is_in_cycle("b"));
        match topological_order(&g) {
            Err(AnalysisError::CycleBlockingSort { cycles }) => {
                assert_eq!(cycles, vec![vec!["a", "b", "c"]])
            }
            other => panic!("expected CycleBlockingSort, got {:?}", other),
        }
    }

    #[test]
    fn test_separate_cycles_are_reported_in_node_order() {
        let g = graph(&[("p", "q"), ("q", "p"), ("a", "a"), ("x", "y"), ("y", "x"), ("q", "x")]);
        assert_eq!(
            g.cycles(),
            [
                vec!["p".to_string(), "q".to_string()],
                vec!["a".to_string()],
                vec!["x".to_string(), "y".to_string()],
            ]
        );
    }

    #[test]
    fn test_topological_order_is_leaves_first() {
        let g = graph(&[("app.ts", "api.ts"), ("api.ts", "util.ts"), ("app.ts", "util.ts")]);
        let order = topological_order(&g).unwrap();

        // util.ts has no node of its own and is skipped.
        assert_eq!(order, vec!["api.ts".to_string(), "app.ts".to_string()]);
    }

    #[test]
    fn test_topological_order_respects_every_edge() {
        let mut builder = DependencyGraphBuilder::new();
        builder
            .add_dependency("d", "b")
            .add_dependency("d", "c")
            .add_dependency("b", "a")
            .add_dependency("c", "a")
            .add_node(crate::model::DependencyNode::new("a"));
        let g = builder.build();
        let order = topological_order(&g).unwrap();
        let pos = |p: &str| order.iter().position(|o| o == p).unwrap();

        for (from, deps) in g.edges() {
            for dep in deps {
                assert!(pos(dep) < pos(from), "{} must precede {}", dep, from);
            }
        }
    }

    #[test]
    fn test_cycle_blocks_sort() {
        let g = graph(&[("x.ts", "y.ts"), ("y.ts", "x.ts")]);
        match topological_order(&g) {
            Err(AnalysisError::CycleBlockingSort { cycles }) => assert_eq!(cycles.len(), 1),
            other => panic!("expected CycleBlockingSort, got {:?}", other),
        }
    }

    #[test]
    fn test_order_within_ignores_outside_edges() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("d", "b")]);
        // a, b, c form a cycle, but restricted to {a, d} there is no edge.
        let order = order_within(&g, &["d".to_string(), "a".to_string()]).unwrap();
        assert_eq!(order, vec!["d".to_string(), "a".to_string()]);
        assert!(order_within(&g, &["a".to_string(), "b".to_string(), "c".to_string()]).is_none());
    }

    #[test]
    fn test_order_within_places_non_nodes_first() {
        let g = graph(&[("a", "b")]);
        let order = order_within(&g, &["a".to_string(), "README.md".to_string()]).unwrap();
        assert_eq!(order, vec!["README.md".to_string(), "a".to_string()]);
    }
}
