//! File-system edge source: reads each file and resolves its imports

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use changegraph_core::paths::{parent_dir, resolve_relative};
use changegraph_core::{normalize_path, EdgeSource, Language, ScannedModule};
use regex::Regex;

static JS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w*{}\s,$]+?\s+from\s+)?["']([^"']+)["']"#)
        .expect("valid import pattern")
});
static JS_REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*export\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s*from\s+["']([^"']+)["']"#,
    )
    .expect("valid re-export pattern")
});
static JS_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require|import)\(\s*["']([^"']+)["']\s*\)"#).expect("valid call pattern")
});
static PY_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*from\s+(\.*[\w.]*)\s+import\s+\(?\s*([\w \t,*]+)")
        .expect("valid from-import pattern")
});
static PY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*import\s+([\w.]+(?:\s*,\s*[\w.]+)*)").expect("valid import pattern")
});
static RUST_MOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)\s*;").expect("valid mod pattern")
});

const JS_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// How an import specifier should be turned into candidate paths.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Specifier {
    /// `./x`, `../x`: relative to the importing file, extension optional.
    Relative(String),
    /// Python module path, already turned into a path without extension.
    PythonModule(String),
    /// `mod x;` in a Rust file: the path stem of the child module.
    RustModule(String),
    /// Package name or anything we cannot resolve.
    Bare(String),
}

/// [`EdgeSource`] that scans files under `root` with regular expressions.
///
/// Only TypeScript, JavaScript, Python and Rust files are read. A file that
/// no longer exists (a deleted change) has no dependencies; any other I/O
/// failure fails the whole scan.
pub struct ImportScanner {
    root: PathBuf,
}

impl ImportScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ImportScanner { root: root.into() }
    }

    fn exists(&self, path: &str, requested: &HashSet<&str>) -> bool {
        requested.contains(path) || self.root.join(path).is_file()
    }

    fn scan_file(&self, path: &str, requested: &HashSet<&str>) -> Result<Vec<String>> {
        let language = Language::from_path(path);
        if !matches!(
            language,
            Language::TypeScript | Language::JavaScript | Language::Python | Language::Rust
        ) {
            return Ok(Vec::new());
        }

        let full = self.root.join(path);
        let content = match fs::read_to_string(&full) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not on disk, scanning as empty", path);
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", full.display()));
            }
        };

        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();
        for specifier in import_specifiers(language, path, &content) {
            let target = self.resolve(path, specifier, requested);
            if !target.is_empty() && seen.insert(target.clone()) {
                dependencies.push(target);
            }
        }
        Ok(dependencies)
    }

    /// First candidate that is part of the scan or exists on disk. Relative
    /// specifiers that resolve nowhere keep their joined path.
    fn resolve(&self, from: &str, specifier: Specifier, requested: &HashSet<&str>) -> String {
        let (fallback, candidates) = match specifier {
            Specifier::Bare(name) => return name,
            Specifier::Relative(raw) => {
                let base = resolve_relative(from, &raw);
                let mut candidates = vec![base.clone()];
                candidates.extend(JS_EXTENSIONS.iter().map(|ext| format!("{base}.{ext}")));
                candidates.extend(JS_EXTENSIONS.iter().map(|ext| format!("{base}/index.{ext}")));
                (base, candidates)
            }
            Specifier::PythonModule(base) => {
                let candidates = vec![format!("{base}.py"), format!("{base}/__init__.py")];
                (base, candidates)
            }
            Specifier::RustModule(base) => {
                let candidates = vec![format!("{base}.rs"), format!("{base}/mod.rs")];
                (format!("{base}.rs"), candidates)
            }
        };

        candidates
            .into_iter()
            .find(|candidate| self.exists(candidate, requested))
            .unwrap_or(fallback)
    }
}

impl EdgeSource for ImportScanner {
    fn scan(&self, paths: &[String]) -> Result<Vec<ScannedModule>> {
        let requested: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let modules = paths
            .iter()
            .map(|path| {
                let path = normalize_path(path);
                let dependencies = self.scan_file(&path, &requested)?;
                Ok(ScannedModule::new(path, dependencies))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Scanned {} files, {} import edges",
            modules.len(),
            modules.iter().map(|m| m.dependencies.len()).sum::<usize>()
        );
        Ok(modules)
    }
}

fn import_specifiers(language: Language, path: &str, content: &str) -> Vec<Specifier> {
    match language {
        Language::TypeScript | Language::JavaScript => js_specifiers(content),
        Language::Python => python_specifiers(path, content),
        Language::Rust => rust_specifiers(path, content),
        _ => Vec::new(),
    }
}

fn js_specifiers(content: &str) -> Vec<Specifier> {
    let mut found: Vec<(usize, &str)> = Vec::new();
    for pattern in [&*JS_IMPORT, &*JS_REEXPORT, &*JS_CALL] {
        for captures in pattern.captures_iter(content) {
            if let Some(m) = captures.get(1) {
                found.push((m.start(), m.as_str()));
            }
        }
    }
    // Source order, whichever pattern matched.
    found.sort_by_key(|(offset, _)| *offset);
    found.dedup_by_key(|(offset, _)| *offset);

    found
        .into_iter()
        .map(|(_, spec)| {
            if spec.starts_with("./") || spec.starts_with("../") || spec == "." || spec == ".." {
                Specifier::Relative(spec.to_string())
            } else {
                Specifier::Bare(spec.to_string())
            }
        })
        .collect()
}

fn python_specifiers(path: &str, content: &str) -> Vec<Specifier> {
    let mut found: Vec<(usize, Specifier)> = Vec::new();

    for captures in PY_FROM.captures_iter(content) {
        let (Some(module), Some(names)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let module_str = module.as_str();
        let dots = module_str.chars().take_while(|c| *c == '.').count();
        let dotted = &module_str[dots..];

        if dots == 0 {
            found.push((module.start(), python_absolute(dotted)));
            continue;
        }

        // `from .. import x` climbs one package per extra dot.
        let mut base = parent_dir(path).to_string();
        for _ in 1..dots {
            base = parent_dir(&base).to_string();
        }
        let join = |rest: &str| {
            let rest = rest.replace('.', "/");
            if base.is_empty() {
                normalize_path(&rest)
            } else {
                normalize_path(&format!("{base}/{rest}"))
            }
        };

        if dotted.is_empty() {
            // `from . import a, b` names sibling modules.
            for name in names.as_str().split(',') {
                let name = name.split_whitespace().next().unwrap_or("");
                if !name.is_empty() && name != "*" {
                    found.push((module.start(), Specifier::PythonModule(join(name))));
                }
            }
        } else {
            found.push((module.start(), Specifier::PythonModule(join(dotted))));
        }
    }

    for captures in PY_IMPORT.captures_iter(content) {
        if let Some(list) = captures.get(1) {
            for module in list.as_str().split(',') {
                found.push((list.start(), python_absolute(module.trim())));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, spec)| spec).collect()
}

/// Absolute module paths are tried from the repository root; a miss leaves
/// the module path as an external target.
fn python_absolute(dotted: &str) -> Specifier {
    if dotted.is_empty() {
        Specifier::Bare(String::new())
    } else {
        Specifier::PythonModule(dotted.replace('.', "/"))
    }
}

fn rust_specifiers(path: &str, content: &str) -> Vec<Specifier> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let dir = parent_dir(path);
    // `mod x;` in lib.rs/main.rs/mod.rs refers to a sibling; anywhere else it
    // refers to a child directory named after the file.
    let module_dir = if matches!(file_name, "lib.rs" | "main.rs" | "mod.rs") {
        dir.to_string()
    } else {
        path.trim_end_matches(".rs").to_string()
    };

    RUST_MOD
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|name| {
            let stem = if module_dir.is_empty() {
                name.as_str().to_string()
            } else {
                format!("{module_dir}/{}", name.as_str())
            };
            Specifier::RustModule(stem)
        })
        .collect()
}
