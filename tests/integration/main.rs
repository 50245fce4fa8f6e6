//! Integration tests for the changegraph binary
//!
//! Each test lays out a small repository in a temp dir and runs the CLI
//! against it.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

/// `index -> app -> utils`, plus an unrelated module and a readme.
fn repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/index.ts", "import { App } from './app';\nexport default App;\n");
    write(
        root,
        "src/app.tsx",
        "import { format } from './utils';\nexport function App() { return format('x'); }\n",
    );
    write(root, "src/utils/index.ts", "export const format = (s: string) => s;\n");
    write(root, "src/lonely.ts", "export const alone = true;\n");
    write(root, "README.md", "# demo\n");
    write(root, "docs/guide.md", "# guide\n");
    dir
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_changegraph"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run changegraph")
}

fn run_json(root: &Path, args: &[&str]) -> Value {
    let output = run(root, args);
    assert!(
        output.status.success(),
        "changegraph failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn group_files(group: &Value) -> Vec<&str> {
    group["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect()
}

#[test]
fn test_cli_invocation() {
    let output = Command::new(env!("CARGO_BIN_EXE_changegraph"))
        .arg("--help")
        .output()
        .expect("failed to run changegraph");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("changegraph"));
    assert!(stdout.contains("analyze"));
}

#[test]
fn test_analyze_groups_connected_files() {
    let dir = repo();
    let result = run_json(
        dir.path(),
        &[
            "analyze",
            "--json",
            "src/index.ts",
            "src/app.tsx",
            "src/utils/index.ts",
            "src/lonely.ts",
        ],
    );

    assert_eq!(result["mode"], "complex");
    assert_eq!(result["totalFiles"], 4);
    let groups = result["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(
        group_files(&groups[0]),
        vec!["src/index.ts", "src/app.tsx", "src/utils/index.ts"]
    );
    assert_eq!(
        groups[0]["commitOrder"],
        serde_json::json!(["src/utils/index.ts", "src/app.tsx", "src/index.ts"])
    );
    assert_eq!(group_files(&groups[1]), vec!["src/lonely.ts"]);
    assert_eq!(groups[1]["estimatedRisk"], "low");
}

#[test]
fn test_analyze_small_doc_change_uses_simple_mode() {
    let dir = repo();
    let result = run_json(dir.path(), &["analyze", "--json", "README.md", "docs/guide.md"]);

    assert_eq!(result["mode"], "simple");
    assert_eq!(result["groups"].as_array().unwrap().len(), 2);
    assert_eq!(result["cycles"], serde_json::json!([]));
}

#[test]
fn test_analyze_reads_config_and_name_status() {
    let dir = repo();
    let root = dir.path();
    write(
        root,
        ".changegraph.toml",
        "[analysis]\nexcludeFiles = [\"*.md\"]\nvalidationCommands = [\"npm test\"]\n",
    );
    write(root, "changes.txt", "M\tsrc/app.tsx\nA\tsrc/utils/index.ts\nM\tREADME.md\n");

    let listing = root.join("changes.txt");
    let result = run_json(
        root,
        &[
            "analyze",
            "--json",
            "--mode",
            "complex",
            "--name-status",
            listing.to_str().unwrap(),
        ],
    );

    assert_eq!(result["excludedFiles"], serde_json::json!(["README.md"]));
    assert_eq!(result["validationCommands"], serde_json::json!(["npm test"]));
    let groups = result["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(group_files(&groups[0]), vec!["src/app.tsx", "src/utils/index.ts"]);
}

#[test]
fn test_analyze_rejects_invalid_exclude_pattern() {
    let dir = repo();
    let output = run(dir.path(), &["analyze", "--exclude", "src/[", "src/app.tsx"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("src/["));
}

#[test]
fn test_analyze_without_changes_fails() {
    let dir = repo();
    let output = run(dir.path(), &["analyze"]);
    assert!(!output.status.success());
}

#[test]
fn test_order_prints_leaves_first() {
    let dir = repo();
    let output = run(dir.path(), &["order", "src/index.ts", "src/app.tsx", "src/utils/index.ts"]);

    assert!(output.status.success());
    let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(lines, vec!["src/utils/index.ts", "src/app.tsx", "src/index.ts"]);
}

#[test]
fn test_order_fails_on_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.ts", "import { b } from './b';\nexport const a = 1;\n");
    write(dir.path(), "b.ts", "import { a } from './a';\nexport const b = 2;\n");

    let output = run(dir.path(), &["order", "a.ts", "b.ts"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cycle:"));
    assert!(stderr.contains("a.ts"));
}

#[test]
fn test_graph_json_lists_edges() {
    let dir = repo();
    let graph = run_json(dir.path(), &["graph", "--json", "src/index.ts", "src/app.tsx"]);
    let text = graph.to_string();

    assert!(text.contains("src/index.ts"));
    assert!(text.contains("src/app.tsx"));
}
