//! Rust surface extraction

use tree_sitter::Node;

use super::{field_text, text, ExtractedSurface};

const NAMED_ITEMS: &[&str] = &[
    "function_item",
    "struct_item",
    "enum_item",
    "union_item",
    "trait_item",
    "type_item",
    "const_item",
    "static_item",
    "mod_item",
];

pub fn extract(root: Node, source: &[u8], surface: &mut ExtractedSurface) {
    let mut cursor = root.walk();
    for item in root.named_children(&mut cursor) {
        let public = is_public(item, source);
        match item.kind() {
            "use_declaration" => {
                if let Some(path) = field_text(item, "argument", source) {
                    surface.add_import(path);
                    if public {
                        surface.add_export(path);
                    }
                }
            }
            "mod_item" => {
                let Some(name) = field_text(item, "name", source) else {
                    continue;
                };
                // `mod x;` pulls in another file
                if item.child_by_field_name("body").is_none() {
                    surface.add_import(name);
                }
                if public {
                    surface.add_export(name);
                }
            }
            "impl_item" => inherent_methods(item, source, surface),
            kind if public && NAMED_ITEMS.contains(&kind) => {
                if let Some(name) = field_text(item, "name", source) {
                    surface.add_export(name);
                }
            }
            _ => {}
        }
    }
}

/// Only plain `pub`; `pub(crate)` and friends stay inside the crate.
fn is_public(item: Node, source: &[u8]) -> bool {
    let mut cursor = item.walk();
    let public = item
        .children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier" && text(c, source) == "pub");
    public
}

/// `pub fn` inside `impl Type { … }`, exported as `Type::name`. Trait impls
/// add no new surface.
fn inherent_methods(item: Node, source: &[u8], surface: &mut ExtractedSurface) {
    if item.child_by_field_name("trait").is_some() {
        return;
    }
    let (Some(type_name), Some(body)) = (
        field_text(item, "type", source),
        item.child_by_field_name("body"),
    ) else {
        return;
    };

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() == "function_item" && is_public(member, source) {
            if let Some(name) = field_text(member, "name", source) {
                surface.add_export(&format!("{type_name}::{name}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::languages::extract_surface;

    #[test]
    fn test_extract_rust_surface() {
        let code = r#"
use std::collections::HashMap;
pub use crate::model::Node;

pub mod graph;
mod util;

pub struct Graph {
    nodes: HashMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Graph { nodes: HashMap::new() }
    }

    fn rebuild(&mut self) {}
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn internal() {}
pub fn build() -> Graph {
    Graph::new()
}
"#;
        let surface = extract_surface("src/lib.rs", code).unwrap();

        assert_eq!(
            surface.imports,
            vec!["std::collections::HashMap", "crate::model::Node", "graph", "util"]
        );
        assert_eq!(
            surface.exports,
            vec!["crate::model::Node", "graph", "Graph", "Graph::new", "build"]
        );
    }
}
