//! Lexical path normalization shared by every stage.
//!
//! Paths are compared as strings, so `./src/a.ts`, `src\a.ts` and
//! `src/lib/../a.ts` must all collapse to the same key before they reach the
//! graph or the grouper.

/// Normalize a path: `\` becomes `/`, empty and `.` segments are dropped and
/// `..` segments are resolved lexically. Leading `..` segments of a relative
/// path are kept.
pub fn normalize_path(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Directory part of a normalized path, or `""` for a top-level file.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Resolve `relative` against the directory containing `from_file`.
pub fn resolve_relative(from_file: &str, relative: &str) -> String {
    let dir = parent_dir(from_file);
    if dir.is_empty() {
        normalize_path(relative)
    } else {
        normalize_path(&format!("{dir}/{relative}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let cases = [
            ("./src/a.ts", "src/a.ts"),
            ("src\\lib\\a.ts", "src/lib/a.ts"),
            ("src//lib/./a.ts", "src/lib/a.ts"),
            ("src/lib/../a.ts", "src/a.ts"),
            ("../shared/a.ts", "../shared/a.ts"),
            ("/repo/./src/a.ts", "/repo/src/a.ts"),
            ("/../a.ts", "/a.ts"),
            ("  a.ts ", "a.ts"),
        ];

        for (raw, expected) in cases {
            assert_eq!(normalize_path(raw), expected, "Failed for {}", raw);
        }
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("src/app/a.ts", "./b"), "src/app/b");
        assert_eq!(resolve_relative("src/app/a.ts", "../lib/c"), "src/lib/c");
        assert_eq!(resolve_relative("a.ts", "./b"), "b");
        assert_eq!(parent_dir("a.ts"), "");
        assert_eq!(parent_dir("src/a.ts"), "src");
    }
}
