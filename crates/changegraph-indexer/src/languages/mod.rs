//! Import/export extraction for the languages with a tree-sitter grammar

pub mod python;
pub mod rust;
pub mod typescript;

use std::path::Path;

use anyhow::{anyhow, Result};
use tree_sitter::{Language, Node, Parser};

/// Languages whose public surface can be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
    Rust,
    Python,
}

impl SurfaceLanguage {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext {
            "ts" | "mts" | "cts" => Some(SurfaceLanguage::TypeScript),
            "tsx" => Some(SurfaceLanguage::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(SurfaceLanguage::JavaScript),
            "rs" => Some(SurfaceLanguage::Rust),
            "py" | "pyi" => Some(SurfaceLanguage::Python),
            _ => None,
        }
    }

    pub fn grammar(self) -> Language {
        match self {
            SurfaceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SurfaceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SurfaceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SurfaceLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SurfaceLanguage::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

/// Imports and exported names of one file, each in first-seen order without
/// duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSurface {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
}

impl ExtractedSurface {
    pub(crate) fn add_import(&mut self, import: &str) {
        if !import.is_empty() && !self.imports.iter().any(|i| i == import) {
            self.imports.push(import.to_string());
        }
    }

    pub(crate) fn add_export(&mut self, export: &str) {
        if !export.is_empty() && !self.exports.iter().any(|e| e == export) {
            self.exports.push(export.to_string());
        }
    }
}

/// Parse `content` as the language implied by `path` and extract its surface.
pub fn extract_surface(path: &str, content: &str) -> Result<ExtractedSurface> {
    let language = SurfaceLanguage::from_path(path)
        .ok_or_else(|| anyhow!("No surface grammar for {}", path))?;

    let mut parser = Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| anyhow!("Failed to set language: {}", e))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| anyhow!("Failed to parse {}", path))?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!("Syntax errors in {}, extracting what parsed", path);
    }

    let source = content.as_bytes();
    let mut surface = ExtractedSurface::default();
    match language {
        SurfaceLanguage::TypeScript | SurfaceLanguage::Tsx | SurfaceLanguage::JavaScript => {
            typescript::extract(root, source, &mut surface)
        }
        SurfaceLanguage::Rust => rust::extract(root, source, &mut surface),
        SurfaceLanguage::Python => python::extract(root, source, &mut surface),
    }
    Ok(surface)
}

pub(crate) fn text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

pub(crate) fn field_text<'a>(node: Node<'_>, field: &str, source: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| text(n, source))
}

pub(crate) fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
