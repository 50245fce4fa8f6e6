//! Python surface extraction

use tree_sitter::Node;

use super::{field_text, text, unquote, ExtractedSurface};

/// Top-level names not starting with `_` are exported, unless `__all__` lists
/// the exports explicitly.
pub fn extract(root: Node, source: &[u8], surface: &mut ExtractedSurface) {
    let mut declared = Vec::new();
    let mut explicit: Option<Vec<String>> = None;

    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "import_statement" => {
                let mut inner = statement.walk();
                for name in statement.named_children(&mut inner) {
                    match name.kind() {
                        "dotted_name" => surface.add_import(text(name, source)),
                        "aliased_import" => {
                            if let Some(module) = field_text(name, "name", source) {
                                surface.add_import(module);
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = field_text(statement, "module_name", source) {
                    surface.add_import(module);
                }
            }
            "function_definition" | "class_definition" => {
                declared.extend(field_text(statement, "name", source));
            }
            "decorated_definition" => {
                if let Some(definition) = statement.child_by_field_name("definition") {
                    declared.extend(field_text(definition, "name", source));
                }
            }
            "expression_statement" => {
                let Some(assignment) = statement
                    .named_child(0)
                    .filter(|n| n.kind() == "assignment")
                else {
                    continue;
                };
                let target = assignment
                    .child_by_field_name("left")
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| text(n, source));
                match target {
                    Some("__all__") => {
                        explicit = assignment
                            .child_by_field_name("right")
                            .map(|list| string_items(list, source));
                    }
                    Some(name) => declared.push(name),
                    None => {}
                }
            }
            _ => {}
        }
    }

    match explicit {
        Some(names) => names.iter().for_each(|n| surface.add_export(n)),
        None => declared
            .into_iter()
            .filter(|name| !name.starts_with('_'))
            .for_each(|name| surface.add_export(name)),
    }
}

fn string_items(list: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = list.walk();
    let items = list
        .named_children(&mut cursor)
        .filter(|item| item.kind() == "string")
        .map(|item| unquote(text(item, source)).to_string())
        .collect();
    items
}
