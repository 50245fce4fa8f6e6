//! `.changegraph.toml` loading and command-line overrides

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use changegraph_core::{AnalysisOptions, ModeOverride};
use serde::Deserialize;

pub const CONFIG_FILE: &str = ".changegraph.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    analysis: AnalysisOptions,
}

/// Options from `<root>/.changegraph.toml`, or the defaults when the file
/// does not exist.
pub fn load(root: &Path) -> Result<AnalysisOptions> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
        return Ok(AnalysisOptions::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let options =
        parse(&content).with_context(|| format!("Invalid config in {}", path.display()))?;
    tracing::debug!("Loaded options from {}: {:?}", path.display(), options);
    Ok(options)
}

pub fn parse(content: &str) -> Result<AnalysisOptions> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.analysis)
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub mode: Option<ModeOverride>,
    pub exclude: Vec<String>,
    pub enhance: bool,
}

impl Overrides {
    /// Flags replace file values; exclude patterns are added to the file's.
    pub fn apply(self, mut options: AnalysisOptions) -> AnalysisOptions {
        if let Some(mode) = self.mode {
            options.mode = mode;
        }
        options.exclude_files.extend(self.exclude);
        if self.enhance {
            options.enhance_with_ast = true;
        }
        options
    }
}
