//! Partitions changed files into atomic commit groups

use std::collections::{HashMap, HashSet};

use petgraph::unionfind::UnionFind;

use crate::cycles::order_within;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::model::{AtomicCommitGroup, DependencyNode, FileChange, RiskLevel};
use crate::options::ExcludeMatcher;
use crate::paths::normalize_path;

/// The changes that take part in an analysis after normalization,
/// de-duplication and exclusion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// First occurrence of every distinct path, in input order.
    pub changes: Vec<FileChange>,
    /// Paths removed by the exclude patterns, in input order.
    pub excluded: Vec<String>,
    /// Number of changes whose path normalized to nothing.
    pub blank: usize,
}

impl ChangeSet {
    pub fn collect(changes: &[FileChange], exclude: &ExcludeMatcher) -> Self {
        let mut set = ChangeSet::default();
        let mut seen: HashSet<String> = HashSet::new();

        for change in changes {
            let path = normalize_path(&change.path);
            if path.is_empty() {
                set.blank += 1;
                continue;
            }
            if !seen.insert(path.clone()) {
                continue;
            }
            if exclude.is_excluded(&path) {
                set.excluded.push(path);
                continue;
            }
            set.changes.push(FileChange {
                path,
                ..change.clone()
            });
        }
        set
    }

    pub fn paths(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.path.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Risk of a single changed file. Files the graph does not know about get
/// their baseline classification.
fn member_risk(graph: &DependencyGraph, path: &str) -> RiskLevel {
    let risk = match graph.node(path) {
        Some(node) => node.risk_level,
        None => DependencyNode::new(path).risk_level,
    };
    if graph.is_in_cycle(path) {
        RiskLevel::High
    } else {
        risk
    }
}

/// Aggregated group risk: the highest member risk, raised to high when any
/// member lies on a cycle. Without a graph every group is low risk.
pub fn aggregate_risk<S: AsRef<str>>(graph: Option<&DependencyGraph>, files: &[S]) -> RiskLevel {
    let Some(graph) = graph else {
        return RiskLevel::Low;
    };
    files
        .iter()
        .map(|f| member_risk(graph, f.as_ref()))
        .max()
        .unwrap_or_default()
}

/// Splits a changeset along dependency connectivity.
#[derive(Debug, Clone, Default)]
pub struct ChangeGrouper {
    exclude: ExcludeMatcher,
}

impl ChangeGrouper {
    pub fn new(exclude: ExcludeMatcher) -> Self {
        ChangeGrouper { exclude }
    }

    /// The changes this grouper will place into groups.
    pub fn select(&self, changes: &[FileChange]) -> ChangeSet {
        ChangeSet::collect(changes, &self.exclude)
    }

    /// Group the changes. With a graph, two changed files share a group when
    /// a chain of dependency edges between changed files connects them.
    /// Without one, every file is its own low-risk group.
    ///
    /// Groups are ordered by their first member's position in the input, and
    /// members keep input order.
    pub fn group(
        &self,
        changes: &[FileChange],
        graph: Option<&DependencyGraph>,
    ) -> Result<Vec<AtomicCommitGroup>> {
        let paths = self.select(changes).paths();
        let groups = match graph {
            None => paths
                .into_iter()
                .enumerate()
                .map(|(i, path)| AtomicCommitGroup {
                    id: group_id(i),
                    rationale: format!("{path} analyzed without a dependency graph"),
                    commit_order: vec![path.clone()],
                    files: vec![path],
                    estimated_risk: RiskLevel::Low,
                    contains_cycle: false,
                })
                .collect(),
            Some(graph) => connected_groups(&paths, graph),
        };

        tracing::debug!("Grouped {} changes into {} groups", changes.len(), groups.len());
        Ok(groups)
    }
}

fn group_id(i: usize) -> String {
    format!("group-{}", i + 1)
}

fn connected_groups(paths: &[String], graph: &DependencyGraph) -> Vec<AtomicCommitGroup> {
    let position: HashMap<&str, usize> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();

    // Only edges between two changed files join groups; unchanged files never
    // bridge components.
    let mut sets: UnionFind<usize> = UnionFind::new(paths.len());
    for (i, path) in paths.iter().enumerate() {
        for dep in graph.dependencies(path) {
            if let Some(&j) = position.get(dep.as_str()) {
                sets.union(i, j);
            }
        }
    }

    let mut component_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<String>> = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let root = sets.find_mut(i);
        let slot = *component_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(path.clone());
    }

    components
        .into_iter()
        .enumerate()
        .map(|(i, files)| build_group(i, files, graph))
        .collect()
}

fn build_group(i: usize, files: Vec<String>, graph: &DependencyGraph) -> AtomicCommitGroup {
    let contains_cycle = files.iter().any(|f| graph.is_in_cycle(f));
    let estimated_risk = aggregate_risk(Some(graph), &files);
    let commit_order = order_within(graph, &files).unwrap_or_else(|| files.clone());

    AtomicCommitGroup {
        id: group_id(i),
        rationale: rationale(&files, graph, contains_cycle),
        estimated_risk,
        contains_cycle,
        commit_order,
        files,
    }
}

fn rationale(files: &[String], graph: &DependencyGraph, contains_cycle: bool) -> String {
    let mut text = if files.len() == 1 {
        format!("{} has no dependency links to other changed files", files[0])
    } else {
        let members: HashSet<&str> = files.iter().map(String::as_str).collect();
        let links = files
            .iter()
            .flat_map(|f| graph.dependencies(f))
            .filter(|dep| members.contains(dep.as_str()))
            .count();
        format!("{} files connected by {} dependency edges", files.len(), links)
    };

    if contains_cycle {
        text.push_str("; contains a circular dependency");
    }
    let api_changes = files
        .iter()
        .filter(|f| graph.node(f).is_some_and(|n| n.api_surface_changes))
        .count();
    if api_changes > 0 {
        text.push_str(&format!("; {api_changes} with public API changes"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraphBuilder;
    use crate::test_utils::changes;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut builder = DependencyGraphBuilder::new();
        for node in nodes {
            builder.add_node(DependencyNode::new(node));
        }
        for (from, to) in edges {
            builder.add_dependency(from, to);
        }
        builder.build()
    }

    fn files(groups: &[AtomicCommitGroup]) -> Vec<Vec<&str>> {
        groups
            .iter()
            .map(|g| g.files.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_connected_and_isolated_files() {
        let g = graph(&["a.ts", "b.ts", "c.ts"], &[("a.ts", "b.ts")]);
        let groups = ChangeGrouper::default()
            .group(&changes(&["a.ts", "b.ts", "c.ts"]), Some(&g))
            .unwrap();

        assert_eq!(files(&groups), vec![vec!["a.ts", "b.ts"], vec!["c.ts"]]);
        assert_eq!(groups[0].id, "group-1");
        assert_eq!(groups[0].commit_order, vec!["b.ts".to_string(), "a.ts".to_string()]);
        assert!(groups.iter().all(|g| g.estimated_risk == RiskLevel::Low));
    }

    #[test]
    fn test_unchanged_files_do_not_bridge_groups() {
        // a → shared ← c, but shared.ts is not part of the change
        let g = graph(&["a.ts", "c.ts"], &[("a.ts", "shared.ts"), ("c.ts", "shared.ts")]);
        let groups = ChangeGrouper::default()
            .group(&changes(&["a.ts", "c.ts"]), Some(&g))
            .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_transitive_chain_through_changed_files() {
        let g = graph(&[], &[("a", "b"), ("c", "b"), ("d", "c")]);
        let groups = ChangeGrouper::default()
            .group(&changes(&["d", "x", "a", "b", "c"]), Some(&g))
            .unwrap();
        assert_eq!(files(&groups), vec![vec!["d", "a", "b", "c"], vec!["x"]]);
    }

    #[test]
    fn test_cycle_escalates_group_risk() {
        let g = graph(&[], &[("x.ts", "y.ts"), ("y.ts", "x.ts")]);
        let groups = ChangeGrouper::default()
            .group(&changes(&["x.ts", "y.ts"]), Some(&g))
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains_cycle);
        assert_eq!(groups[0].estimated_risk, RiskLevel::High);
        assert_eq!(groups[0].commit_order, groups[0].files);
        assert!(groups[0].rationale.contains("circular"));
    }

    #[test]
    fn test_risk_is_member_maximum() {
        let mut builder = DependencyGraphBuilder::new();
        builder
            .add_node(DependencyNode::new("src/app.ts"))
            .add_node(DependencyNode::new("tsconfig.json"))
            .add_dependency("src/app.ts", "tsconfig.json");
        let g = builder.build();

        let groups = ChangeGrouper::default()
            .group(&changes(&["src/app.ts", "tsconfig.json"]), Some(&g))
            .unwrap();
        assert_eq!(groups[0].estimated_risk, RiskLevel::Medium);
    }

    #[test]
    fn test_simple_grouping_is_one_low_risk_group_per_file() {
        let groups = ChangeGrouper::default()
            .group(&changes(&["README.md", "docs/a.md"]), None)
            .unwrap();
        assert_eq!(files(&groups), vec![vec!["README.md"], vec!["docs/a.md"]]);
        assert!(groups.iter().all(|g| g.estimated_risk == RiskLevel::Low));
    }

    #[test]
    fn test_duplicates_and_excludes_are_dropped() {
        let exclude = ExcludeMatcher::new(&["*.lock".to_string()]).unwrap();
        let input = vec![
            FileChange::modified("./a.ts"),
            FileChange::modified("a.ts"),
            FileChange::modified("yarn.lock"),
        ];
        let grouper = ChangeGrouper::new(exclude);
        let selected = grouper.select(&input);
        assert_eq!(selected.paths(), vec!["a.ts".to_string()]);
        assert_eq!(selected.excluded, vec!["yarn.lock".to_string()]);

        let groups = grouper.group(&input, None).unwrap();
        assert_eq!(files(&groups), vec![vec!["a.ts"]]);
    }
}
