//! Builds the dependency graph for a changeset

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::cancel::CancellationToken;
use crate::collaborators::{EdgeSource, ModuleParser};
use crate::enhance::ModuleEnhancer;
use crate::error::{AnalysisError, EnhancementError, Result};
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::model::{ChangeKind, DependencyNode, FileChange};
use crate::paths::normalize_path;

/// A freshly built graph plus the recoverable problems met on the way.
#[derive(Debug)]
pub struct Assembly {
    pub graph: DependencyGraph,
    pub warnings: Vec<String>,
}

/// Combines edge-source output and parser findings into one graph.
pub struct GraphAssembler<'a> {
    edge_source: &'a dyn EdgeSource,
    parser: Option<&'a dyn ModuleParser>,
    parallel: bool,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(edge_source: &'a dyn EdgeSource) -> Self {
        GraphAssembler {
            edge_source,
            parser: None,
            parallel: true,
        }
    }

    pub fn with_parser(mut self, parser: &'a dyn ModuleParser) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Scan the changed paths once and build the graph. Enhancement runs only
    /// when `enhance` is set and a parser is configured; a failing file keeps
    /// its unenhanced node.
    pub fn assemble(
        &self,
        changes: &[FileChange],
        enhance: bool,
        cancel: &CancellationToken,
    ) -> Result<Assembly> {
        let mut warnings = Vec::new();
        let mut kinds: HashMap<String, ChangeKind> = HashMap::new();
        let mut paths: Vec<String> = Vec::with_capacity(changes.len());
        for change in changes {
            let path = normalize_path(&change.path);
            if !kinds.contains_key(&path) {
                kinds.insert(path.clone(), change.kind);
                paths.push(path);
            }
        }

        cancel.check()?;
        tracing::debug!("Scanning {} paths for dependency edges", paths.len());
        let scanned = self
            .edge_source
            .scan(&paths)
            .map_err(|source| AnalysisError::GraphBuild { source })?;

        // Scanned entries may name files outside the changeset; they become
        // nodes after the changed files.
        let mut scanned_paths: Vec<String> = Vec::new();
        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        for module in scanned {
            let path = normalize_path(&module.path);
            if path.is_empty() {
                continue;
            }
            if !dependencies.contains_key(&path) {
                scanned_paths.push(path.clone());
            }
            dependencies
                .entry(path)
                .or_default()
                .extend(module.dependencies);
        }

        let reported: HashSet<&str> = scanned_paths.iter().map(String::as_str).collect();
        for path in &paths {
            if !reported.contains(path.as_str()) {
                tracing::warn!("Edge source returned no entry for {}", path);
                warnings.push(format!(
                    "edge source returned no entry for {path}; treated as having no dependencies"
                ));
            }
        }

        let mut nodes: Vec<DependencyNode> = paths
            .iter()
            .map(|path| DependencyNode::for_change(&FileChange::new(path, kinds[path])))
            .collect();
        nodes.extend(
            scanned_paths
                .iter()
                .filter(|path| !kinds.contains_key(path.as_str()))
                .map(DependencyNode::new),
        );

        if enhance {
            if let Some(parser) = self.parser {
                nodes = self.enhance_nodes(nodes, parser, &kinds, cancel, &mut warnings)?;
            }
        }

        cancel.check()?;
        let mut builder = DependencyGraphBuilder::new();
        for node in nodes {
            builder.add_node(node);
        }
        for path in paths.iter().chain(scanned_paths.iter()) {
            if let Some(targets) = dependencies.get(path) {
                builder.add_dependencies(path, targets);
            }
        }
        let graph = builder.build();

        let external = graph.external_dependencies().len();
        if external > 0 {
            tracing::debug!("{} unresolved dependencies", external);
        }

        Ok(Assembly { graph, warnings })
    }

    fn enhance_nodes(
        &self,
        nodes: Vec<DependencyNode>,
        parser: &dyn ModuleParser,
        kinds: &HashMap<String, ChangeKind>,
        cancel: &CancellationToken,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<DependencyNode>> {
        let enhancer = ModuleEnhancer::new(parser);
        // Deleted files have nothing left to parse.
        let eligible = |node: &DependencyNode| {
            kinds.get(&node.path) != Some(&ChangeKind::Deleted) && enhancer.can_enhance(node)
        };
        let enhance_one = |node: DependencyNode| -> Result<(DependencyNode, Option<EnhancementError>)> {
            cancel.check()?;
            if eligible(&node) {
                Ok(enhancer.enhance_or_keep(&node))
            } else {
                Ok((node, None))
            }
        };

        let outcomes: Vec<(DependencyNode, Option<EnhancementError>)> = if self.parallel {
            nodes.into_par_iter().map(enhance_one).collect::<Result<_>>()?
        } else {
            nodes.into_iter().map(enhance_one).collect::<Result<_>>()?
        };

        let mut enhanced = Vec::with_capacity(outcomes.len());
        for (node, error) in outcomes {
            if let Some(error) = error {
                warnings.push(error.to_string());
            }
            enhanced.push(node);
        }
        Ok(enhanced)
    }
}
