//! Public entry point: mode selection, assembly, grouping and validation

use std::time::Instant;

use crate::assemble::{Assembly, GraphAssembler};
use crate::cancel::CancellationToken;
use crate::collaborators::{EdgeSource, ModuleParser};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::grouping::{ChangeGrouper, ChangeSet};
use crate::mode::ModeSelector;
use crate::model::{AnalysisMode, AnalysisResult, AtomicCommitGroup, FileChange, RiskLevel};
use crate::options::{AnalysisOptions, ExcludeMatcher};
use crate::validate::GroupValidator;

/// Runs change analysis against the collaborators it was built with. Holds no
/// per-call state, so one engine can serve any number of calls.
pub struct AnalysisEngine {
    edge_source: Box<dyn EdgeSource>,
    parser: Option<Box<dyn ModuleParser>>,
}

impl AnalysisEngine {
    pub fn new(edge_source: impl EdgeSource + 'static) -> Self {
        AnalysisEngine {
            edge_source: Box::new(edge_source),
            parser: None,
        }
    }

    pub fn with_parser(mut self, parser: impl ModuleParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    fn assembler(&self, parallel: bool) -> GraphAssembler<'_> {
        let assembler = GraphAssembler::new(&*self.edge_source).parallel(parallel);
        match self.parser.as_deref() {
            Some(parser) => assembler.with_parser(parser),
            None => assembler,
        }
    }

    pub fn analyze_changes(
        &self,
        changes: &[FileChange],
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult> {
        self.analyze_changes_with_cancel(changes, options, &CancellationToken::new())
    }

    /// Like [`analyze_changes`](Self::analyze_changes), checking `cancel`
    /// before every stage and between enhancement calls.
    pub fn analyze_changes_with_cancel(
        &self,
        changes: &[FileChange],
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let started = Instant::now();
        cancel.check()?;

        let exclude = ExcludeMatcher::from_options(options)?;
        let selection = ChangeSet::collect(changes, &exclude);
        let mut warnings = Vec::new();
        if selection.blank > 0 {
            warnings.push(format!("{} changes with an empty path ignored", selection.blank));
        }
        if !selection.excluded.is_empty() {
            tracing::debug!("Excluded: {:?}", selection.excluded);
            warnings.push(format!(
                "{} files excluded by excludeFiles",
                selection.excluded.len()
            ));
        }

        let mode = if selection.is_empty() {
            AnalysisMode::Simple
        } else {
            ModeSelector::from_options(options).select(&selection.changes, options.mode)
        };
        tracing::debug!("Analyzing {} changes in {} mode", selection.changes.len(), mode);

        let graph = match mode {
            AnalysisMode::Simple => None,
            AnalysisMode::Complex => {
                if options.enhance_with_ast && self.parser.is_none() {
                    warnings.push(
                        "enhanceWithAST requested but no module parser is configured".to_string(),
                    );
                }
                let Assembly {
                    graph,
                    warnings: assembly_warnings,
                } = self.assembler(options.parallel_enhancement).assemble(
                    &selection.changes,
                    options.enhance_with_ast,
                    cancel,
                )?;
                warnings.extend(assembly_warnings);
                Some(graph)
            }
        };

        cancel.check()?;
        let grouper = ChangeGrouper::new(exclude);
        let groups = grouper.group(&selection.changes, graph.as_ref())?;

        cancel.check()?;
        GroupValidator::validate(&groups, &selection.paths(), graph.as_ref())?;

        let cycles = graph
            .as_ref()
            .map(|g| g.cycles().to_vec())
            .unwrap_or_default();
        if !cycles.is_empty() {
            warnings.push(format!("{} circular dependencies found", cycles.len()));
        }
        let high_risk = groups
            .iter()
            .filter(|g| g.estimated_risk == RiskLevel::High)
            .count();
        if high_risk > 0 {
            warnings.push(format!(
                "{high_risk} high-risk groups detected - review recommended"
            ));
        }

        let elapsed = started.elapsed();
        tracing::info!(
            "Analyzed {} files in {:?}: {} mode, {} groups, {} warnings",
            selection.changes.len(),
            elapsed,
            mode,
            groups.len(),
            warnings.len()
        );

        Ok(AnalysisResult {
            mode,
            total_files: selection.changes.len(),
            groups,
            elapsed,
            warnings,
            cycles,
            excluded_files: selection.excluded,
            validation_commands: options.validation_commands.clone(),
        })
    }

    /// Build the dependency graph for `paths`, enhancing nodes when a parser
    /// is configured. Enhancement failures are logged and otherwise ignored.
    pub fn generate_dependency_graph(&self, paths: &[String]) -> Result<DependencyGraph> {
        let changes: Vec<FileChange> = paths.iter().map(FileChange::modified).collect();
        let assembly = self.assembler(true).assemble(
            &changes,
            self.parser.is_some(),
            &CancellationToken::new(),
        )?;
        for warning in &assembly.warnings {
            tracing::warn!("{}", warning);
        }
        Ok(assembly.graph)
    }

    /// Group `changes` against an already built graph and validate the
    /// result. Files matching `options.exclude_files` are left out.
    pub fn group_changes(
        &self,
        changes: &[FileChange],
        graph: &DependencyGraph,
        options: &AnalysisOptions,
    ) -> Result<Vec<AtomicCommitGroup>> {
        let grouper = ChangeGrouper::new(ExcludeMatcher::from_options(options)?);
        let expected = grouper.select(changes).paths();
        let groups = grouper.group(changes, Some(graph))?;
        GroupValidator::validate(&groups, &expected, Some(graph))?;
        Ok(groups)
    }
}
