//! Tree-sitter module parser with export baselines

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use changegraph_core::{normalize_path, ModuleParser, ModuleSurface};

use crate::languages::{extract_surface, SurfaceLanguage};

/// [`ModuleParser`] that reads files under `root` and extracts their imports
/// and exports with tree-sitter.
///
/// The API surface counts as changed when a baseline export set is registered
/// for the file and the current exports differ from it. Without a baseline
/// nothing is known about the previous surface and the flag stays off.
#[derive(Debug, Clone)]
pub struct SurfaceParser {
    root: PathBuf,
    baselines: HashMap<String, BTreeSet<String>>,
}

impl SurfaceParser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SurfaceParser {
            root: root.into(),
            baselines: HashMap::new(),
        }
    }

    /// Register the exports `path` had before the change.
    pub fn with_baseline<I, S>(mut self, path: &str, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baselines.insert(
            normalize_path(path),
            exports.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Register the baseline from the file's previous content.
    pub fn with_baseline_source(self, path: &str, previous: &str) -> Result<Self> {
        let previous = extract_surface(path, previous)
            .with_context(|| format!("Failed to extract baseline surface of {}", path))?;
        Ok(self.with_baseline(path, previous.exports))
    }
}

impl ModuleParser for SurfaceParser {
    fn supports(&self, path: &str) -> bool {
        SurfaceLanguage::from_path(path).is_some()
    }

    fn parse(&self, path: &str) -> Result<ModuleSurface> {
        let path = normalize_path(path);
        let full = self.root.join(&path);
        let content = fs::read_to_string(&full)
            .with_context(|| format!("Failed to read {}", full.display()))?;
        let extracted = extract_surface(&path, &content)?;

        let api_surface_changed = match self.baselines.get(&path) {
            Some(baseline) => {
                let current: BTreeSet<&str> = extracted.exports.iter().map(String::as_str).collect();
                let previous: BTreeSet<&str> = baseline.iter().map(String::as_str).collect();
                if current != previous {
                    tracing::debug!(
                        "Exports of {} changed: {:?} -> {:?}",
                        path,
                        previous,
                        current
                    );
                }
                current != previous
            }
            None => false,
        };

        Ok(ModuleSurface {
            imports: extracted.imports,
            exports: extracted.exports,
            api_surface_changed,
        })
    }
}
