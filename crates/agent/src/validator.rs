//! Structural validation of forest candidates.
//!
//! Works on raw JSON so that every defect can be reported with a path before
//! the candidate is converted into typed [`CatalogNode`](catalogist_core::CatalogNode)s.
//! Errors accumulate; a bad node never stops its siblings or children from
//! being checked.

use serde_json::Value;

/// Return every structural problem in `candidate`; empty means valid.
pub fn validate(candidate: &Value) -> Vec<String> {
    let Some(nodes) = candidate.as_array() else {
        return vec!["structure must be a list".into()];
    };
    if nodes.is_empty() {
        return vec!["structure must not be empty".into()];
    }

    let mut errors = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        validate_node(node, &format!("root/node{i}"), &mut errors);
    }
    errors
}

/// Convenience for an already-unwrapped list of nodes.
pub fn validate_nodes(nodes: &[Value]) -> Vec<String> {
    validate(&Value::Array(nodes.to_vec()))
}

fn validate_node(node: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(object) = node.as_object() else {
        errors.push(format!("{path}: node must be an object"));
        return;
    };

    let name = match object.get("name") {
        None => {
            errors.push(format!("{path}: missing name field"));
            None
        }
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name.as_str()),
        Some(_) => {
            errors.push(format!("{path}: name must be a non-empty string"));
            None
        }
    };

    match object.get("children") {
        None | Some(Value::Null) => {}
        Some(Value::Array(children)) => {
            for (i, child) in children.iter().enumerate() {
                let segment = name.map(str::to_string).unwrap_or_else(|| format!("node{i}"));
                validate_node(child, &format!("{path}/{segment}"), errors);
            }
        }
        Some(_) => errors.push(format!("{path}: children must be a list")),
    }
}
