//! Decides whether a changeset needs graph analysis

use std::collections::HashSet;

use crate::model::{AnalysisMode, FileChange, Language};
use crate::options::{AnalysisOptions, ModeOverride};

/// Cheap pre-check that lets trivial changesets skip graph construction.
#[derive(Debug, Clone, Copy)]
pub struct ModeSelector {
    max_simple_files: usize,
}

impl ModeSelector {
    pub fn new(max_simple_files: usize) -> Self {
        ModeSelector { max_simple_files }
    }

    pub fn from_options(options: &AnalysisOptions) -> Self {
        Self::new(options.simple_mode_max_files)
    }

    /// `Complex` when requested, when more than `max_simple_files` distinct
    /// files changed, or when any changed file is source code.
    pub fn select(&self, changes: &[FileChange], requested: ModeOverride) -> AnalysisMode {
        match requested {
            ModeOverride::Simple => return AnalysisMode::Simple,
            ModeOverride::Complex => return AnalysisMode::Complex,
            ModeOverride::Auto => {}
        }

        let distinct: HashSet<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        if distinct.len() > self.max_simple_files {
            tracing::debug!(
                "{} files changed (threshold {}), using complex mode",
                distinct.len(),
                self.max_simple_files
            );
            return AnalysisMode::Complex;
        }

        if let Some(source) = distinct
            .iter()
            .find(|path| Language::from_path(path).is_source())
        {
            tracing::debug!("Source file {} changed, using complex mode", source);
            return AnalysisMode::Complex;
        }

        AnalysisMode::Simple
    }
}

impl Default for ModeSelector {
    fn default() -> Self {
        Self::from_options(&AnalysisOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(paths: &[&str]) -> Vec<FileChange> {
        paths.iter().map(FileChange::modified).collect()
    }

    #[test]
    fn test_docs_only_is_simple() {
        let selector = ModeSelector::default();
        let mode = selector.select(&changes(&["README.md", "docs/intro.md"]), ModeOverride::Auto);
        assert_eq!(mode, AnalysisMode::Simple);
    }

    #[test]
    fn test_source_file_forces_complex() {
        let selector = ModeSelector::default();
        let mode = selector.select(&changes(&["README.md", "src/lib.rs"]), ModeOverride::Auto);
        assert_eq!(mode, AnalysisMode::Complex);
    }

    #[test]
    fn test_file_count_threshold_counts_distinct_paths() {
        let selector = ModeSelector::new(2);
        let repeated = changes(&["a.md", "a.md", "b.md"]);
        assert_eq!(selector.select(&repeated, ModeOverride::Auto), AnalysisMode::Simple);

        let many = changes(&["a.md", "b.md", "c.md"]);
        assert_eq!(selector.select(&many, ModeOverride::Auto), AnalysisMode::Complex);
    }

    #[test]
    fn test_overrides_win() {
        let selector = ModeSelector::default();
        assert_eq!(
            selector.select(&changes(&["a.md"]), ModeOverride::Complex),
            AnalysisMode::Complex
        );
        assert_eq!(
            selector.select(&changes(&["src/a.ts"]), ModeOverride::Simple),
            AnalysisMode::Simple
        );
    }
}
