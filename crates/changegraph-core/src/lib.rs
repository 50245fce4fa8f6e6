//! Changegraph Core: dependency graph, cycle detection and change grouping

pub mod assemble;
pub mod cancel;
pub mod collaborators;
pub mod cycles;
pub mod engine;
pub mod enhance;
pub mod error;
pub mod graph;
pub mod grouping;
pub mod mode;
pub mod model;
pub mod options;
pub mod paths;
pub mod validate;


#[cfg(test)]
pub mod test_utils;

pub use assemble::{Assembly, GraphAssembler};
pub use cancel::CancellationToken;
pub use collaborators::{
    EdgeSource, ModuleParser, ModuleSurface, ScannedModule, StaticEdgeSource, StaticModuleParser,
};
pub use cycles::{cyclic_components, detect_cycles, order_within, topological_order};
pub use engine::AnalysisEngine;
pub use enhance::ModuleEnhancer;
pub use error::{AnalysisError, EnhancementError, Result};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
pub use grouping::{aggregate_risk, ChangeGrouper, ChangeSet};
pub use mode::ModeSelector;
pub use model::{
    parse_name_status_lines, AnalysisMode, AnalysisResult, AtomicCommitGroup, ChangeDelta,
    ChangeKind, DependencyNode, FileChange, Language, NodeType, RiskLevel,
};
pub use options::{AnalysisOptions, ExcludeMatcher, ModeOverride, DEFAULT_SIMPLE_MODE_MAX_FILES};
pub use paths::normalize_path;
