//! Immutable dependency graph and the builder that produces it

use std::collections::{HashMap, HashSet};

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::cycles;
use crate::model::DependencyNode;
use crate::paths::normalize_path;

/// Directed file graph: `a → b` means "a depends on b".
///
/// Nodes keep insertion order, which drives every traversal. The value is
/// frozen once built; use [`DependencyGraphBuilder`] to produce a new one.
#[derive(Clone, PartialEq)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    /// `edges[i]` holds the direct dependencies of `nodes[i]`.
    edges: Vec<Vec<String>>,
    index: HashMap<String, usize>,
    cycles: Vec<Vec<String>>,
    cycle_members: HashSet<String>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edge_count())
            .field("cycle_count", &self.cycles.len())
            .finish()
    }
}

impl DependencyGraph {
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// An empty graph.
    pub fn empty() -> Self {
        DependencyGraphBuilder::new().build()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of edges, external targets included.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&DependencyNode> {
        self.index.get(path).map(|&i| &self.nodes[i])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.nodes.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.path.as_str())
    }

    /// `(path, direct dependencies)` in node insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.nodes
            .iter()
            .zip(&self.edges)
            .map(|(node, deps)| (node.path.as_str(), deps.as_slice()))
    }

    /// Direct dependencies of a node; empty for unknown paths.
    pub fn dependencies(&self, path: &str) -> &[String] {
        self.index
            .get(path)
            .map(|&i| self.edges[i].as_slice())
            .unwrap_or(&[])
    }

    /// Nodes that directly depend on `path`, in insertion order.
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.edges()
            .filter(|(_, deps)| deps.iter().any(|d| d == path))
            .map(|(from, _)| from)
            .collect()
    }

    /// Edge targets with no node of their own, first-seen order.
    pub fn external_dependencies(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut external = Vec::new();
        for target in self.edges.iter().flatten() {
            if !self.index.contains_key(target) && seen.insert(target.as_str()) {
                external.push(target.as_str());
            }
        }
        external
    }

    /// Cycles found by depth-first traversal, one per back edge.
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Every node lying on some cycle.
    pub fn cycle_members(&self) -> &HashSet<String> {
        &self.cycle_members
    }

    pub fn is_in_cycle(&self, path: &str) -> bool {
        self.cycle_members.contains(path)
    }

    pub(crate) fn position(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    pub(crate) fn node_at(&self, idx: usize) -> &DependencyNode {
        &self.nodes[idx]
    }

    pub(crate) fn dependencies_at(&self, idx: usize) -> &[String] {
        &self.edges[idx]
    }

    /// A builder seeded with this graph's nodes and edges.
    pub fn to_builder(&self) -> DependencyGraphBuilder {
        DependencyGraphBuilder {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            index: self.index.clone(),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::empty()
    }
}

struct EdgeMap<'a>(&'a DependencyGraph);

impl Serialize for EdgeMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.edges())
    }
}

impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DependencyGraph", 4)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.serialize_field("edges", &EdgeMap(self))?;
        state.serialize_field("cycles", &self.cycles)?;
        state.serialize_field("external", &self.external_dependencies())?;
        state.end()
    }
}

/// Accumulates nodes and edges, then freezes them into a [`DependencyGraph`].
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    nodes: Vec<DependencyNode>,
    edges: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Insert a node, or replace the value stored for its path. A replaced
    /// node keeps its original position and edges.
    pub fn add_node(&mut self, node: DependencyNode) -> &mut Self {
        match self.index.get(&node.path) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.index.insert(node.path.clone(), self.nodes.len());
                self.nodes.push(node);
                self.edges.push(Vec::new());
            }
        }
        self
    }

    /// Record `from → to`. A missing `from` node is created; `to` stays an
    /// external target until a node is added for it. Duplicate edges are
    /// ignored.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> &mut Self {
        let from = normalize_path(from);
        let to = normalize_path(to);
        if from.is_empty() || to.is_empty() {
            return self;
        }

        let idx = match self.index.get(&from) {
            Some(&i) => i,
            None => {
                self.add_node(DependencyNode::new(&from));
                self.nodes.len() - 1
            }
        };

        let deps = &mut self.edges[idx];
        if !deps.contains(&to) {
            deps.push(to);
        }
        self
    }

    pub fn add_dependencies<I, S>(&mut self, from: &str, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for target in targets {
            self.add_dependency(from, target.as_ref());
        }
        self
    }

    /// Run cycle detection and freeze the graph.
    pub fn build(self) -> DependencyGraph {
        let mut graph = DependencyGraph {
            nodes: self.nodes,
            edges: self.edges,
            index: self.index,
            cycles: Vec::new(),
            cycle_members: HashSet::new(),
        };
        graph.cycles = cycles::detect_cycles(&graph);
        graph.cycle_members = cycles::cycle_members(&graph);

        tracing::debug!(
            "Built dependency graph: {} nodes, {} edges, {} cycles",
            graph.len(),
            graph.edge_count(),
            graph.cycles.len()
        );
        graph
    }
}
