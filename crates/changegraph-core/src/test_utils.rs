//! Test doubles for the collaborator traits

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;

use crate::cancel::CancellationToken;
use crate::collaborators::{EdgeSource, ModuleParser, ModuleSurface, ScannedModule};
use crate::model::FileChange;

/// Modified-file changes for each path.
pub fn changes(paths: &[&str]) -> Vec<FileChange> {
    paths.iter().map(FileChange::modified).collect()
}

/// Edge source whose scan always fails.
pub struct FailingEdgeSource;

impl EdgeSource for FailingEdgeSource {
    fn scan(&self, _paths: &[String]) -> anyhow::Result<Vec<ScannedModule>> {
        bail!("scanner crashed")
    }
}

/// Edge source that only reports the paths it was told about.
pub struct PartialEdgeSource {
    known: HashSet<String>,
}

impl PartialEdgeSource {
    pub fn new<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PartialEdgeSource {
            known: known.into_iter().map(Into::into).collect(),
        }
    }
}

impl EdgeSource for PartialEdgeSource {
    fn scan(&self, paths: &[String]) -> anyhow::Result<Vec<ScannedModule>> {
        Ok(paths
            .iter()
            .filter(|path| self.known.contains(path.as_str()))
            .map(|path| ScannedModule::new(path.clone(), Vec::new()))
            .collect())
    }
}

/// Parser that records how often it was invoked and returns an empty surface.
#[derive(Default)]
pub struct CountingParser {
    calls: AtomicUsize,
}

impl CountingParser {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModuleParser for CountingParser {
    fn parse(&self, _path: &str) -> anyhow::Result<ModuleSurface> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModuleSurface::default())
    }
}

/// Parser that cancels `token` on its first call, standing in for a caller
/// giving up while enhancement is under way.
pub struct CancellingParser {
    token: CancellationToken,
    calls: AtomicUsize,
}

impl CancellingParser {
    pub fn new(token: CancellationToken) -> Self {
        CancellingParser {
            token,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModuleParser for CancellingParser {
    fn parse(&self, _path: &str) -> anyhow::Result<ModuleSurface> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
        Ok(ModuleSurface::default())
    }
}

/// Edge source that cancels `token` while scanning and reports no edges.
pub struct CancellingEdgeSource {
    pub token: CancellationToken,
}

impl EdgeSource for CancellingEdgeSource {
    fn scan(&self, paths: &[String]) -> anyhow::Result<Vec<ScannedModule>> {
        self.token.cancel();
        Ok(paths
            .iter()
            .map(|path| ScannedModule::new(path.clone(), Vec::new()))
            .collect())
    }
}
