//! Error taxonomy for the analysis pipeline

use thiserror::Error;

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

/// Failures surfaced to callers of the engine.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The edge source could not produce edges. Nothing can be grouped safely.
    #[error("failed to build dependency graph: {source}")]
    GraphBuild {
        #[source]
        source: anyhow::Error,
    },

    #[error("circular dependency blocks topological ordering ({} cycle(s))", .cycles.len())]
    CycleBlockingSort { cycles: Vec<Vec<String>> },

    /// A change was lost, duplicated or invented between input and output.
    #[error("grouping invariant violated: {reason}")]
    GroupingInvariant { reason: String },

    #[error("group validation failed: {reason}")]
    Validation { reason: String },

    #[error("analysis cancelled")]
    Cancelled,

    #[error("invalid exclude pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid change line `{line}`: {reason}")]
    InvalidChange { line: String, reason: String },
}

impl AnalysisError {
    /// `CycleBlockingSort` describes the graph rather than a broken run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AnalysisError::CycleBlockingSort { .. })
    }
}

/// A single node could not be enhanced. Recoverable: the node keeps its
/// unenhanced value and the failure becomes a warning.
#[derive(Error, Debug)]
#[error("enhancement skipped for {path}: {source}")]
pub struct EnhancementError {
    pub path: String,
    #[source]
    pub source: anyhow::Error,
}
