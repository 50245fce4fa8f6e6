//! Core data structures for change analysis

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collaborators::ModuleSurface;
use crate::error::{AnalysisError, Result};
use crate::paths::normalize_path;

/// Languages recognised from file extensions and well-known file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Yaml,
    Toml,
    Json,
    Css,
    Html,
    Markdown,
    Dockerfile,
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("rs") => Language::Rust,
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c") | Some("h") => Language::C,
            Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") => Language::Cpp,
            Some("yml") | Some("yaml") => Language::Yaml,
            Some("toml") => Language::Toml,
            Some("json") | Some("jsonc") => Language::Json,
            Some("css") | Some("scss") | Some("sass") | Some("less") => Language::Css,
            Some("html") | Some("htm") => Language::Html,
            Some("md") | Some("mdx") => Language::Markdown,
            _ => {
                if path.file_name().is_some_and(|n| {
                    let s = n.to_string_lossy();
                    s == "Dockerfile" || s.starts_with("Dockerfile.")
                }) {
                    Language::Dockerfile
                } else {
                    Language::Other
                }
            }
        }
    }

    /// Whether files in this language carry an import/export surface.
    pub fn is_source(self) -> bool {
        matches!(
            self,
            Language::Rust
                | Language::TypeScript
                | Language::JavaScript
                | Language::Python
                | Language::Go
                | Language::Java
                | Language::C
                | Language::Cpp
        )
    }
}

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "bmp", "woff", "woff2", "ttf", "otf",
    "eot", "mp3", "mp4", "wav", "webm", "pdf",
];

const CONFIG_EXTENSIONS: &[&str] = &["ini", "cfg", "conf", "env", "lock", "properties"];

const CONFIG_FILE_NAMES: &[&str] = &["Makefile", "Dockerfile", ".gitignore", ".npmrc", ".nvmrc"];

/// Coarse classification of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Source,
    Asset,
    Config,
    Other,
}

impl NodeType {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let language = Language::from_path(path);
        if language.is_source() {
            return NodeType::Source;
        }
        match language {
            Language::Yaml | Language::Toml | Language::Json | Language::Dockerfile => {
                return NodeType::Config;
            }
            Language::Css | Language::Html => return NodeType::Asset,
            _ => {}
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if ASSET_EXTENSIONS.contains(&ext) => NodeType::Asset,
            Some(ext) if CONFIG_EXTENSIONS.contains(&ext) => NodeType::Config,
            _ if CONFIG_FILE_NAMES.contains(&file_name.as_str())
                || file_name.starts_with(".env")
                || (file_name.starts_with('.') && file_name.ends_with("rc")) =>
            {
                NodeType::Config
            }
            _ => NodeType::Other,
        }
    }
}

/// Ordered risk classification. `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => f.write_str("low"),
            RiskLevel::Medium => f.write_str("medium"),
            RiskLevel::High => f.write_str("high"),
        }
    }
}

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// Line counts attached to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeDelta {
    pub insertions: u32,
    pub deletions: u32,
}

/// One modified file, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    /// Source path of a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<ChangeDelta>,
}

impl FileChange {
    /// Create a change; the path is normalized.
    pub fn new(path: impl AsRef<str>, kind: ChangeKind) -> Self {
        FileChange {
            path: normalize_path(path.as_ref()),
            kind,
            previous_path: None,
            delta: None,
        }
    }

    pub fn added(path: impl AsRef<str>) -> Self {
        Self::new(path, ChangeKind::Added)
    }

    pub fn modified(path: impl AsRef<str>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }

    pub fn deleted(path: impl AsRef<str>) -> Self {
        Self::new(path, ChangeKind::Deleted)
    }

    pub fn renamed(from: impl AsRef<str>, to: impl AsRef<str>) -> Self {
        FileChange {
            previous_path: Some(normalize_path(from.as_ref())),
            ..Self::new(to, ChangeKind::Renamed)
        }
    }

    pub fn with_delta(self, insertions: u32, deletions: u32) -> Self {
        FileChange {
            delta: Some(ChangeDelta {
                insertions,
                deletions,
            }),
            ..self
        }
    }

    /// Parse one line of `git diff --name-status` output.
    ///
    /// Copies (`C<score>`) are treated as additions of the destination path and
    /// type changes (`T`) as modifications.
    pub fn parse_name_status(line: &str) -> Result<Self> {
        let invalid = |reason: &str| AnalysisError::InvalidChange {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = line.split('\t').map(str::trim).filter(|f| !f.is_empty());
        let status = fields.next().ok_or_else(|| invalid("empty line"))?;
        let first = fields.next().ok_or_else(|| invalid("missing path"))?;
        let second = fields.next();

        let change = match status.chars().next() {
            Some('A') => FileChange::added(first),
            Some('M') | Some('T') => FileChange::modified(first),
            Some('D') => FileChange::deleted(first),
            Some('R') => {
                let to = second.ok_or_else(|| invalid("rename without destination path"))?;
                FileChange::renamed(first, to)
            }
            Some('C') => {
                let to = second.ok_or_else(|| invalid("copy without destination path"))?;
                FileChange::added(to)
            }
            _ => return Err(invalid("unknown status letter")),
        };

        if change.path.is_empty() {
            return Err(invalid("empty path"));
        }
        Ok(change)
    }
}

/// Parse a full `git diff --name-status` listing, skipping blank lines.
pub fn parse_name_status_lines(text: &str) -> Result<Vec<FileChange>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(FileChange::parse_name_status)
        .collect()
}

/// One file's facet in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    pub path: String,
    pub node_type: NodeType,
    pub language: Language,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub api_surface_changes: bool,
    pub risk_level: RiskLevel,
}

impl DependencyNode {
    /// Node for a path with no change information (treated as modified).
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::with_kind(path, ChangeKind::Modified)
    }

    pub fn for_change(change: &FileChange) -> Self {
        Self::with_kind(&change.path, change.kind)
    }

    fn with_kind(path: impl AsRef<str>, kind: ChangeKind) -> Self {
        let path = normalize_path(path.as_ref());
        let node_type = NodeType::from_path(&path);
        let risk_level = match (node_type, kind) {
            (NodeType::Config, _) => RiskLevel::Medium,
            (NodeType::Source, ChangeKind::Deleted) => RiskLevel::Medium,
            _ => RiskLevel::Low,
        };

        DependencyNode {
            language: Language::from_path(&path),
            path,
            node_type,
            imports: Vec::new(),
            exports: Vec::new(),
            api_surface_changes: false,
            risk_level,
        }
    }

    /// A new node carrying the parser's findings. Risk escalates to high when
    /// the API surface changed; it never drops below the current level.
    pub fn with_surface(&self, surface: ModuleSurface) -> Self {
        let risk_level = if surface.api_surface_changed {
            RiskLevel::High
        } else {
            self.risk_level
        };

        DependencyNode {
            path: self.path.clone(),
            node_type: self.node_type,
            language: self.language,
            imports: surface.imports,
            exports: surface.exports,
            api_surface_changes: surface.api_surface_changed,
            risk_level,
        }
    }
}

/// A set of changed files that must be committed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicCommitGroup {
    pub id: String,
    /// Members in input order.
    pub files: Vec<String>,
    pub estimated_risk: RiskLevel,
    pub rationale: String,
    pub contains_cycle: bool,
    /// Members with dependencies before dependents. Input order when the
    /// group contains a cycle.
    pub commit_order: Vec<String>,
}

impl AtomicCommitGroup {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Whether graph analysis ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Simple,
    Complex,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Simple => f.write_str("simple"),
            AnalysisMode::Complex => f.write_str("complex"),
        }
    }
}

/// Outcome of one `analyze_changes` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub mode: AnalysisMode,
    pub groups: Vec<AtomicCommitGroup>,
    pub total_files: usize,
    #[serde(rename = "elapsedMs", with = "duration_ms")]
    pub elapsed: Duration,
    pub warnings: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub excluded_files: Vec<String>,
    pub validation_commands: Vec<String>,
}

impl AnalysisResult {
    pub fn high_risk_groups(&self) -> impl Iterator<Item = &AtomicCommitGroup> {
        self.groups
            .iter()
            .filter(|g| g.estimated_risk == RiskLevel::High)
    }

    /// The group a file landed in.
    pub fn group_of(&self, path: &str) -> Option<&AtomicCommitGroup> {
        let path = normalize_path(path);
        self.groups.iter().find(|g| g.contains(&path))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_detection() {
        let cases = [
            ("src/app.ts", NodeType::Source),
            ("lib/mod.rs", NodeType::Source),
            ("tool.py", NodeType::Source),
            ("Cargo.toml", NodeType::Config),
            ("package.json", NodeType::Config),
            (".env.local", NodeType::Config),
            (".eslintrc", NodeType::Config),
            ("Cargo.lock", NodeType::Config),
            ("logo.svg", NodeType::Asset),
            ("styles/main.css", NodeType::Asset),
            ("README.md", NodeType::Other),
            ("notes.txt", NodeType::Other),
        ];

        for (path, expected) in cases {
            assert_eq!(NodeType::from_path(path), expected, "Failed for {}", path);
        }
    }

    #[test]
    fn test_baseline_risk() {
        assert_eq!(DependencyNode::new("a.ts").risk_level, RiskLevel::Low);
        assert_eq!(DependencyNode::new("tsconfig.json").risk_level, RiskLevel::Medium);
        assert_eq!(
            DependencyNode::for_change(&FileChange::deleted("a.ts")).risk_level,
            RiskLevel::Medium
        );
        assert_eq!(
            DependencyNode::for_change(&FileChange::deleted("a.md")).risk_level,
            RiskLevel::Low
        );
    }

    #[test]
    fn test_with_surface_returns_new_node() {
        let node = DependencyNode::new("src/a.ts");
        let enhanced = node.with_surface(ModuleSurface {
            imports: vec!["./b".into()],
            exports: vec!["run".into()],
            api_surface_changed: true,
        });

        assert_eq!(node.risk_level, RiskLevel::Low);
        assert!(!node.api_surface_changes);
        assert_eq!(enhanced.risk_level, RiskLevel::High);
        assert_eq!(enhanced.exports, vec!["run".to_string()]);
    }

    #[test]
    fn test_parse_name_status() {
        let text = "M\tsrc/a.ts\nA\tsrc/new.ts\n\nD\told.ts\nR087\tsrc/x.ts\tsrc/y.ts\nC100\ta.ts\tb.ts\n";
        let changes = parse_name_status_lines(text).unwrap();

        assert_eq!(changes.len(), 5);
        assert_eq!(changes[0], FileChange::modified("src/a.ts"));
        assert_eq!(changes[1].kind, ChangeKind::Added);
        assert_eq!(changes[2].kind, ChangeKind::Deleted);
        assert_eq!(changes[3].path, "src/y.ts");
        assert_eq!(changes[3].previous_path.as_deref(), Some("src/x.ts"));
        assert_eq!(changes[4], FileChange::added("b.ts"));
    }

    #[test]
    fn test_parse_name_status_rejects_garbage() {
        assert!(matches!(
            FileChange::parse_name_status("X\tfoo"),
            Err(AnalysisError::InvalidChange { .. })
        ));
        assert!(FileChange::parse_name_status("R100\tonly-one").is_err());
        assert!(FileChange::parse_name_status("M").is_err());
    }

    #[test]
    fn test_risk_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(
            [RiskLevel::Medium, RiskLevel::High, RiskLevel::Low]
                .into_iter()
                .max(),
            Some(RiskLevel::High)
        );
    }
}
