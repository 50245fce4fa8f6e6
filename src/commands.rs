//! CLI command implementations

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use changegraph_core::{
    parse_name_status_lines, topological_order, AnalysisEngine, AnalysisError, AnalysisOptions,
    AnalysisResult, ChangeKind, FileChange,
};
use changegraph_indexer::{ImportScanner, SurfaceLanguage, SurfaceParser};

/// Changes from `--name-status` input followed by plain paths. A path that no
/// longer exists under `root` is taken as deleted.
pub fn read_changes(
    root: &Path,
    paths: Vec<String>,
    name_status: Option<&str>,
) -> Result<Vec<FileChange>> {
    let mut changes = match name_status {
        Some("-") => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read name-status from stdin")?;
            parse_name_status_lines(&text)?
        }
        Some(file) => {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read name-status file {}", file))?;
            parse_name_status_lines(&text)?
        }
        None => Vec::new(),
    };

    changes.extend(paths.into_iter().map(|path| {
        if root.join(&path).exists() {
            FileChange::modified(path)
        } else {
            FileChange::deleted(path)
        }
    }));

    if changes.is_empty() {
        bail!("No changes given: pass file paths or --name-status");
    }
    Ok(changes)
}

pub fn analyze(
    root: &Path,
    changes: &[FileChange],
    options: &AnalysisOptions,
    baseline_ref: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut parser = SurfaceParser::new(root);
    if let Some(rev) = baseline_ref {
        parser = load_baselines(root, rev, changes, parser)?;
    }
    let engine = AnalysisEngine::new(ImportScanner::new(root)).with_parser(parser);

    let result = engine.analyze_changes(changes, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

pub fn graph(root: &Path, changes: &[FileChange], json: bool) -> Result<()> {
    let engine =
        AnalysisEngine::new(ImportScanner::new(root)).with_parser(SurfaceParser::new(root));
    let graph = engine.generate_dependency_graph(&change_paths(changes))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!("{} nodes, {} edges", graph.len(), graph.edge_count());
    for (from, targets) in graph.edges() {
        for to in targets {
            println!("  {} -> {}", from, to);
        }
    }
    for cycle in graph.cycles() {
        println!("cycle: {}", cycle.join(" -> "));
    }
    Ok(())
}

pub fn order(root: &Path, changes: &[FileChange]) -> Result<()> {
    let engine = AnalysisEngine::new(ImportScanner::new(root));
    let graph = engine.generate_dependency_graph(&change_paths(changes))?;

    match topological_order(&graph) {
        Ok(order) => {
            for path in order {
                println!("{}", path);
            }
            Ok(())
        }
        Err(AnalysisError::CycleBlockingSort { cycles }) => {
            for cycle in &cycles {
                eprintln!("cycle: {}", cycle.join(" -> "));
            }
            bail!("{} circular dependencies block ordering", cycles.len())
        }
        Err(err) => Err(err.into()),
    }
}

fn change_paths(changes: &[FileChange]) -> Vec<String> {
    changes.iter().map(|c| c.path.clone()).collect()
}

/// Register the exports each changed module had at `rev`. Files absent from
/// `rev` get an empty baseline, so any export they have counts as new API.
fn load_baselines(
    root: &Path,
    rev: &str,
    changes: &[FileChange],
    mut parser: SurfaceParser,
) -> Result<SurfaceParser> {
    let verify = Command::new("git")
        .args(["rev-parse", "--verify", "--quiet"])
        .arg(format!("{}^{{commit}}", rev))
        .current_dir(root)
        .output()
        .context("Failed to run git")?;
    if !verify.status.success() {
        bail!("Unknown git revision {}", rev);
    }

    for change in changes {
        if change.kind == ChangeKind::Deleted
            || SurfaceLanguage::from_path(&change.path).is_none()
        {
            continue;
        }
        let previous_path = change.previous_path.as_deref().unwrap_or(&change.path);
        parser = match git_show(root, rev, previous_path)? {
            Some(previous) => parser.with_baseline_source(&change.path, &previous)?,
            None => parser.with_baseline(&change.path, Vec::<String>::new()),
        };
    }
    Ok(parser)
}

fn git_show(root: &Path, rev: &str, path: &str) -> Result<Option<String>> {
    let output = Command::new("git")
        .arg("show")
        .arg(format!("{}:{}", rev, path))
        .current_dir(root)
        .output()
        .context("Failed to run git show")?;

    if !output.status.success() {
        tracing::debug!("{} not present at {}", path, rev);
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

fn print_result(result: &AnalysisResult) {
    println!(
        "Mode: {} ({} files, {} groups, {}ms)",
        result.mode,
        result.total_files,
        result.groups.len(),
        result.elapsed.as_millis()
    );

    for group in &result.groups {
        println!();
        println!("{} [{}] {}", group.id, group.estimated_risk, group.rationale);
        for path in &group.commit_order {
            println!("  {}", path);
        }
    }

    if !result.excluded_files.is_empty() {
        println!();
        println!("Excluded:");
        for path in &result.excluded_files {
            println!("  {}", path);
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    if !result.validation_commands.is_empty() {
        println!();
        println!("Validate with:");
        for command in &result.validation_commands {
            println!("  {}", command);
        }
    }
}
