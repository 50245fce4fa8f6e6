//! Caller-supplied options and the compiled exclude matcher

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Default upper bound on files a changeset may touch and still skip graph
/// analysis.
pub const DEFAULT_SIMPLE_MODE_MAX_FILES: usize = 3;

/// Requested analysis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeOverride {
    #[default]
    Auto,
    Simple,
    Complex,
}

/// Options recognised by the engine. Deserializes from camelCase keys, so a
/// `[analysis]` TOML table or a JSON object can be fed straight in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub mode: ModeOverride,
    /// Glob patterns; matching files are left out of the analysis.
    pub exclude_files: Vec<String>,
    #[serde(rename = "enhanceWithAST")]
    pub enhance_with_ast: bool,
    /// Opaque to the engine, copied into the result for the caller.
    pub validation_commands: Vec<String>,
    pub simple_mode_max_files: usize,
    pub parallel_enhancement: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            mode: ModeOverride::Auto,
            exclude_files: Vec::new(),
            enhance_with_ast: false,
            validation_commands: Vec::new(),
            simple_mode_max_files: DEFAULT_SIMPLE_MODE_MAX_FILES,
            parallel_enhancement: true,
        }
    }
}

impl AnalysisOptions {
    pub fn with_mode(mut self, mode: ModeOverride) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_enhancement(mut self, enabled: bool) -> Self {
        self.enhance_with_ast = enabled;
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_files.push(pattern.into());
        self
    }
}

/// Compiled form of `exclude_files`.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
    set: GlobSet,
}

impl ExcludeMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| AnalysisError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        let set = builder
            .build()
            .map_err(|source| AnalysisError::InvalidPattern {
                pattern: patterns.join(", "),
                source,
            })?;

        Ok(ExcludeMatcher { set })
    }

    pub fn from_options(options: &AnalysisOptions) -> Result<Self> {
        Self::new(&options.exclude_files)
    }

    /// A matcher that excludes nothing.
    pub fn empty() -> Self {
        ExcludeMatcher {
            set: GlobSet::empty(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        !self.set.is_empty() && self.set.is_match(path)
    }
}

impl Default for ExcludeMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_matcher() {
        let matcher =
            ExcludeMatcher::new(&["*.md".to_string(), "vendor/**".to_string()]).unwrap();

        assert!(matcher.is_excluded("README.md"));
        assert!(matcher.is_excluded("docs/guide.md"));
        assert!(matcher.is_excluded("vendor/lib/a.ts"));
        assert!(!matcher.is_excluded("src/a.ts"));
        assert!(!ExcludeMatcher::empty().is_excluded("anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeMatcher::new(&["src/[".to_string()]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidPattern { ref pattern, .. } if pattern == "src/["));
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let json = r#"{
            "mode": "complex",
            "excludeFiles": ["*.lock"],
            "enhanceWithAST": true,
            "validationCommands": ["npm test"]
        }"#;
        let options: AnalysisOptions = serde_json::from_str(json).unwrap();

        assert_eq!(options.mode, ModeOverride::Complex);
        assert_eq!(options.exclude_files, vec!["*.lock".to_string()]);
        assert!(options.enhance_with_ast);
        assert_eq!(options.validation_commands, vec!["npm test".to_string()]);
        assert_eq!(options.simple_mode_max_files, DEFAULT_SIMPLE_MODE_MAX_FILES);
        assert!(options.parallel_enhancement);
    }
}
