//! Seams to the external analysis tools the engine is constructed with

use std::collections::HashMap;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::paths::normalize_path;

/// One file's direct dependencies as reported by an [`EdgeSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedModule {
    pub path: String,
    /// Direct dependency paths. Targets that are not themselves scanned are
    /// external or unresolved.
    pub dependencies: Vec<String>,
}

impl ScannedModule {
    pub fn new(path: impl Into<String>, dependencies: Vec<String>) -> Self {
        ScannedModule {
            path: path.into(),
            dependencies,
        }
    }
}

/// Import/export facts extracted from one file by a [`ModuleParser`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSurface {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub api_surface_changed: bool,
}

/// Produces raw directed edges (file → direct dependencies).
pub trait EdgeSource: Send + Sync {
    /// Scan `paths` and return one entry per path. Failure aborts analysis.
    fn scan(&self, paths: &[String]) -> anyhow::Result<Vec<ScannedModule>>;
}

/// Extracts the import/export surface of a single file. Must be free of side
/// effects; the engine may call it from several threads at once.
pub trait ModuleParser: Send + Sync {
    /// Whether this parser understands the file at all. Unsupported files are
    /// skipped without a warning.
    fn supports(&self, _path: &str) -> bool {
        true
    }

    fn parse(&self, path: &str) -> anyhow::Result<ModuleSurface>;
}

impl<T: EdgeSource + ?Sized> EdgeSource for Box<T> {
    fn scan(&self, paths: &[String]) -> anyhow::Result<Vec<ScannedModule>> {
        (**self).scan(paths)
    }
}

impl<T: ModuleParser + ?Sized> ModuleParser for Box<T> {
    fn supports(&self, path: &str) -> bool {
        (**self).supports(path)
    }

    fn parse(&self, path: &str) -> anyhow::Result<ModuleSurface> {
        (**self).parse(path)
    }
}

/// Edge source backed by a precomputed edge table. Paths missing from the
/// table are reported with no dependencies.
#[derive(Debug, Clone, Default)]
pub struct StaticEdgeSource {
    edges: HashMap<String, Vec<String>>,
}

impl StaticEdgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `from → to` edges. Repeated calls for the same file append.
    pub fn with_edges<I, S>(mut self, from: &str, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.edges
            .entry(normalize_path(from))
            .or_default()
            .extend(to.into_iter().map(|t| normalize_path(t.as_ref())));
        self
    }
}

impl EdgeSource for StaticEdgeSource {
    fn scan(&self, paths: &[String]) -> anyhow::Result<Vec<ScannedModule>> {
        Ok(paths
            .iter()
            .map(|path| {
                let dependencies = self
                    .edges
                    .get(&normalize_path(path))
                    .cloned()
                    .unwrap_or_default();
                ScannedModule::new(path.clone(), dependencies)
            })
            .collect())
    }
}

/// Module parser backed by precomputed surfaces. Unknown paths fail to parse.
#[derive(Debug, Clone, Default)]
pub struct StaticModuleParser {
    surfaces: HashMap<String, ModuleSurface>,
}

impl StaticModuleParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surface(mut self, path: &str, surface: ModuleSurface) -> Self {
        self.surfaces.insert(normalize_path(path), surface);
        self
    }
}

impl ModuleParser for StaticModuleParser {
    fn parse(&self, path: &str) -> anyhow::Result<ModuleSurface> {
        self.surfaces
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| anyhow!("no module surface registered for {path}"))
    }
}
