//! TypeScript and JavaScript surface extraction

use tree_sitter::Node;

use super::{field_text, text, unquote, ExtractedSurface};

pub fn extract(root: Node, source: &[u8], surface: &mut ExtractedSurface) {
    let mut cursor = root.walk();
    for statement in root.named_children(&mut cursor) {
        match statement.kind() {
            "import_statement" => {
                if let Some(module) = field_text(statement, "source", source) {
                    surface.add_import(unquote(module));
                }
            }
            "export_statement" => extract_export(statement, source, surface),
            _ => {}
        }
    }

    collect_calls(root, source, surface);
}

fn extract_export(node: Node, source: &[u8], surface: &mut ExtractedSurface) {
    let reexported_from = field_text(node, "source", source).map(unquote);
    if let Some(module) = reexported_from {
        surface.add_import(module);
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();

    if children.iter().any(|c| c.kind() == "default") {
        surface.add_export("default");
        return;
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        declared_names(declaration, source, surface);
    }

    for child in &children {
        match child.kind() {
            "export_clause" => {
                let mut inner = child.walk();
                for specifier in child.named_children(&mut inner) {
                    if specifier.kind() != "export_specifier" {
                        continue;
                    }
                    let name = field_text(specifier, "alias", source)
                        .or_else(|| field_text(specifier, "name", source));
                    if let Some(name) = name {
                        surface.add_export(unquote(name));
                    }
                }
            }
            "*" => {
                if let Some(module) = reexported_from {
                    surface.add_export(&format!("* from {module}"));
                }
            }
            "namespace_export" => {
                if let Some(name) = child.named_child(0) {
                    surface.add_export(text(name, source));
                }
            }
            _ => {}
        }
    }
}

fn declared_names(declaration: Node, source: &[u8], surface: &mut ExtractedSurface) {
    match declaration.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = declaration.walk();
            for declarator in declaration.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    pattern_names(name, source, surface);
                }
            }
        }
        _ => {
            if let Some(name) = field_text(declaration, "name", source) {
                surface.add_export(name);
            }
        }
    }
}

/// Names bound by a declarator, including destructuring patterns.
fn pattern_names(pattern: Node, source: &[u8], surface: &mut ExtractedSurface) {
    match pattern.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            surface.add_export(text(pattern, source))
        }
        "pair_pattern" => {
            if let Some(value) = pattern.child_by_field_name("value") {
                pattern_names(value, source, surface);
            }
        }
        _ => {
            let mut cursor = pattern.walk();
            for child in pattern.named_children(&mut cursor) {
                pattern_names(child, source, surface);
            }
        }
    }
}

/// `require("x")` and `import("x")` anywhere in the file.
fn collect_calls(node: Node, source: &[u8], surface: &mut ExtractedSurface) {
    if node.kind() == "call_expression" {
        let is_loader = node.child_by_field_name("function").is_some_and(|function| {
            function.kind() == "import"
                || (function.kind() == "identifier" && text(function, source) == "require")
        });
        if is_loader {
            let module = node
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string");
            if let Some(module) = module {
                surface.add_import(unquote(text(module, source)));
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_calls(child, source, surface);
    }
}
